use crate::error::Result;

#[async_trait]
pub trait AsyncIterator {
    type Item;
    async fn try_next(&mut self) -> Result<Option<Self::Item>>;

    /// try_collect drains the iterator, stopping at the first error.
    async fn try_collect(&mut self) -> Result<Vec<Self::Item>>
    where
        Self: Send,
        Self::Item: Send,
    {
        let mut items = vec![];
        while let Some(item) = self.try_next().await? {
            items.push(item);
        }
        Ok(items)
    }
}
