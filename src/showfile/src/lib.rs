#[macro_use]
extern crate async_trait;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate tracing;

pub mod codec;
pub mod common;
pub mod config;
pub mod error;
pub mod format;
pub mod rth;

pub use common::iterator::AsyncIterator;
pub use config::{ShowFileConfig, ShowFileOptions};
pub use error::{Result, ShowFileError};
pub use format::block::{Block, BlockType};
pub use format::reader::{BlockIterator, ShowFileReader};
pub use format::registry::{BlockTypeRegistry, BlockTypeRegistryBuilder};
pub use format::writer::ShowFileWriter;
pub use format::Features;
pub use rth::decoder::{decode_rth_plan, RthPlanDecoder};
pub use rth::encoder::{encode_rth_plan, RthPlanEncoder};
pub use rth::plan::{RthAction, RthPlan, RthPlanEntry};
