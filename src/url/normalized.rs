use super::host::{HostNormalizer, NormalizedHost};
use super::marker::UrlMarker;
use super::path::PathNormalizer;
use super::Url;
use crate::error::UrlError;
use std::cell::OnceCell;

/// 规范化视图：主机和路径在首次访问时计算并缓存
///
/// Every other part is read straight from the wrapped [`Url`].
#[derive(Debug, Clone)]
pub struct NormalizedUrl {
    url: Url,
    host: OnceCell<NormalizedHost>,
    path: OnceCell<String>,
}

impl NormalizedUrl {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            host: OnceCell::new(),
            path: OnceCell::new(),
        }
    }

    /// [`Url::create`] followed by normalization.
    pub fn create(text: &str) -> Result<Self, UrlError> {
        Url::create(text).map(Self::new)
    }

    fn normalized_host(&self) -> &NormalizedHost {
        self.host.get_or_init(|| HostNormalizer::normalize(self.url.host()))
    }

    pub fn host(&self) -> &str {
        &self.normalized_host().host
    }

    /// 16 bytes for IP hosts (IPv4 in mapped form), `None` otherwise.
    pub fn host_bytes(&self) -> Option<&[u8]> {
        self.normalized_host().bytes.as_ref().map(|b| b.as_slice())
    }

    pub fn path(&self) -> &str {
        self.path.get_or_init(|| PathNormalizer::normalize(self.url.path()))
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn username(&self) -> &str {
        self.url.username()
    }

    pub fn password(&self) -> &str {
        self.url.password()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn query(&self) -> &str {
        self.url.query()
    }

    pub fn fragment(&self) -> &str {
        self.url.fragment()
    }

    pub fn marker(&self) -> &UrlMarker {
        self.url.marker()
    }

    pub fn original_url(&self) -> &str {
        self.url.original_url()
    }

    pub fn full_url(&self) -> String {
        self.url.render(self.host(), self.path(), true)
    }

    pub fn full_url_without_fragment(&self) -> String {
        self.url.render(self.host(), self.path(), false)
    }

    pub fn into_inner(self) -> Url {
        self.url
    }
}

impl PartialEq for NormalizedUrl {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl std::fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_url())
    }
}
