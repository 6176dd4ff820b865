use super::Url;
use crate::error::UrlError;

/// URL 各部件，按在 URL 中出现的顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UrlPart {
    Scheme,
    UsernamePassword,
    Host,
    Port,
    Path,
    Query,
    Fragment,
}

impl UrlPart {
    pub const ALL: [UrlPart; 7] = [
        UrlPart::Scheme,
        UrlPart::UsernamePassword,
        UrlPart::Host,
        UrlPart::Port,
        UrlPart::Path,
        UrlPart::Query,
        UrlPart::Fragment,
    ];

    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }

    /// The part that follows this one, if any.
    pub fn next(self) -> Option<UrlPart> {
        Self::ALL.get(self.index() + 1).copied()
    }
}

/// Byte offsets of each part inside a matched string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlMarker {
    indices: [Option<usize>; 7],
}

impl UrlMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, part: UrlPart, index: usize) -> &mut Self {
        self.indices[part.index()] = Some(index);
        self
    }

    pub fn unset(&mut self, part: UrlPart) -> &mut Self {
        self.indices[part.index()] = None;
        self
    }

    #[inline(always)]
    pub fn index_of(&self, part: UrlPart) -> Option<usize> {
        self.indices[part.index()]
    }

    /// Sets all seven offsets at once, in part order; negative means absent.
    pub fn set_indices(&mut self, indices: &[isize]) -> Result<&mut Self, UrlError> {
        if indices.len() != UrlPart::ALL.len() {
            return Err(UrlError::MalformedIndices(indices.len()));
        }
        for (slot, &raw) in self.indices.iter_mut().zip(indices) {
            *slot = usize::try_from(raw).ok();
        }
        Ok(self)
    }

    /// The nearest part after `part` that has an offset.
    pub fn next_present(&self, part: UrlPart) -> Option<(UrlPart, usize)> {
        let mut cursor = part.next();
        while let Some(p) = cursor {
            if let Some(idx) = self.index_of(p) {
                return Some((p, idx));
            }
            cursor = p.next();
        }
        None
    }

    pub fn create_url(self, original: impl Into<String>) -> Url {
        Url::new(original.into(), self)
    }
}
