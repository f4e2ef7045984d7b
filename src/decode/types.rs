//! Decoder traits
//!
//! A decoder turns one page body into typed items. It is the only place
//! where the generic engine meets a concrete resource type.

use crate::error::Result;

/// Decodes one page body into zero or more items.
///
/// `page` is the 0-indexed page tag; decoders should include it in any
/// error they return.
pub trait RecordDecoder<T>: Send + Sync {
    /// Decode a full page body
    fn decode(&self, page: usize, body: &[u8]) -> Result<Vec<T>>;
}

impl<T, F> RecordDecoder<T> for F
where
    F: Fn(usize, &[u8]) -> Result<Vec<T>> + Send + Sync,
{
    fn decode(&self, page: usize, body: &[u8]) -> Result<Vec<T>> {
        self(page, body)
    }
}

/// Combinators available on every decoder
pub trait RecordDecoderExt<T>: RecordDecoder<T> + Sized {
    /// Convert each decoded item with `f`.
    ///
    /// Used to funnel several item kinds through one output type, e.g.
    /// files and folders into a single entry enum.
    fn map_items<U, F>(self, f: F) -> MapItems<Self, F, T>
    where
        F: Fn(T) -> U + Send + Sync,
    {
        MapItems {
            inner: self,
            f,
            _item: std::marker::PhantomData,
        }
    }
}

impl<T, D: RecordDecoder<T>> RecordDecoderExt<T> for D {}

/// Decoder returned by [`RecordDecoderExt::map_items`]
pub struct MapItems<D, F, T> {
    inner: D,
    f: F,
    _item: std::marker::PhantomData<fn() -> T>,
}

impl<D, F, T, U> RecordDecoder<U> for MapItems<D, F, T>
where
    D: RecordDecoder<T>,
    F: Fn(T) -> U + Send + Sync,
{
    fn decode(&self, page: usize, body: &[u8]) -> Result<Vec<U>> {
        Ok(self
            .inner
            .decode(page, body)?
            .into_iter()
            .map(&self.f)
            .collect())
    }
}
