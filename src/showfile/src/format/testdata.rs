pub(crate) const TRAJECTORY_BODY: &[u8] = b"\n\x00\x00\x00\x00\x00\x00\x00\x00\x10\x10'\xe8\x03\
    \x01\x10'\xe8\x03\x04\x10'\xe8\x03\x05\x10'\x00\x00\x00\x00\
    \x10\x10'\x00\x00";

pub(crate) const SIMPLE_SKYB_FILE_V1: &[u8] = b"skyb\x01\
    \x01$\x00\n\x00\x00\x00\x00\x00\x00\x00\x00\x10\x10'\xe8\x03\
    \x01\x10'\xe8\x03\x04\x10'\xe8\x03\x05\x10'\x00\x00\x00\x00\
    \x10\x10'\x00\x00\
    \x03\x13\x00this is a test file";

pub(crate) const SIMPLE_SKYB_FILE_V2: &[u8] = b"skyb\x02\x01\
    (\xda\xd0\x83\
    \x01$\x00\n\x00\x00\x00\x00\x00\x00\x00\x00\x10\x10'\xe8\x03\
    \x01\x10'\xe8\x03\x04\x10'\xe8\x03\x05\x10'\x00\x00\x00\x00\
    \x10\x10'\x00\x00\
    \x03\x13\x00this is a test file";
