use super::schemes::SchemeSet;
use crate::error::UrlError;
use bitflags::bitflags;

bitflags! {
    /// Detection behavior switches.
    ///
    /// The matching flags make the detector treat quotes and brackets as
    /// delimiters, so that `"www.a.com"` in JSON or `(www.a.com)` in prose
    /// stop at the closing character.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct DetectorOptions: u32 {
        /// `"` opens and closes a delimited region.
        const QUOTE_MATCH = 1 << 0;
        /// `'` opens and closes a delimited region.
        const SINGLE_QUOTE_MATCH = 1 << 1;
        /// `[ ] { } ( )` delimit.
        const BRACKET_MATCH = 1 << 2;
        /// `< >` delimit, plus double quotes.
        const XML = (1 << 3) | Self::QUOTE_MATCH.bits();
        /// Accept hosts without a dot (`localhost`, `intranet`).
        const ALLOW_SINGLE_LEVEL_DOMAIN = 1 << 5;

        // 预设组合
        const JSON = Self::QUOTE_MATCH.bits() | Self::BRACKET_MATCH.bits();
        const JAVASCRIPT = Self::JSON.bits() | Self::SINGLE_QUOTE_MATCH.bits();
        const HTML = Self::XML.bits() | Self::SINGLE_QUOTE_MATCH.bits() | (1 << 4);
    }
}

/// 检测配置：选项位 + 已编译的协议集合
#[derive(Debug, Clone, Default)]
pub struct DetectorConfig {
    pub options: DetectorOptions,
    pub schemes: SchemeSet,
}

impl DetectorConfig {
    pub fn new(options: DetectorOptions) -> Self {
        Self {
            options,
            schemes: SchemeSet::default(),
        }
    }

    /// Builds a config with a custom scheme allow-list. Names are trimmed
    /// and lower-cased; an empty list keeps the default schemes.
    pub fn with_schemes<I, S>(options: DetectorOptions, schemes: I) -> Result<Self, UrlError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            options,
            schemes: SchemeSet::compile(schemes)?,
        })
    }

    #[inline(always)]
    pub fn has(&self, flag: DetectorOptions) -> bool {
        self.options.contains(flag)
    }
}
