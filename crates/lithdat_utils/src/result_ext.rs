use crate::AnyResult;
use anyhow::anyhow;
use std::{error::Error, fmt::Display};

/// Turns plain results and options into [`AnyResult`], with a message describing what failed.
pub trait AnyhowResultExt<T> {
    fn otherwise(self, message: impl Display) -> AnyResult<T>;
}

impl<T, E: Error + Send + Sync + 'static> AnyhowResultExt<T> for Result<T, E> {
    fn otherwise(self, message: impl Display) -> AnyResult<T> {
        self.map_err(|e| anyhow::Error::new(e).context(message.to_string()))
    }
}

impl<T> AnyhowResultExt<T> for Option<T> {
    fn otherwise(self, message: impl Display) -> AnyResult<T> {
        self.ok_or_else(|| anyhow!("{message}"))
    }
}
