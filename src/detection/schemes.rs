use crate::error::UrlError;
use crate::utils::chars::is_scheme_char;
use aho_corasick::{AhoCorasick, MatchKind};
use ahash::AHashSet;
use smallvec::SmallVec;
use std::sync::Arc;

pub const DEFAULT_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

/// Suffix lookup over the `name://` and `name%3a//` forms.
#[derive(Debug, Clone)]
enum SuffixLookup {
    /// 自动机：所有后缀形式一次扫描
    Automaton(Arc<AhoCorasick>),
    /// 线性回退：逐个比较后缀（自动机构建失败时使用）
    Linear(SmallVec<[String; 8]>),
}

/// Allow-list of scheme names recognized by the detector.
#[derive(Debug, Clone)]
pub struct SchemeSet {
    names: AHashSet<String>,
    lookup: SuffixLookup,
}

fn suffixed_forms(names: &AHashSet<String>) -> Vec<String> {
    let mut sorted: Vec<&String> = names.iter().collect();
    sorted.sort();
    let mut patterns = Vec::with_capacity(sorted.len() * 2);
    for name in sorted {
        // 1. name://
        patterns.push(format!("{name}://"));
        // 2. name%3a//
        patterns.push(format!("{name}%3a//"));
    }
    patterns
}

fn normalize_names<I, S>(schemes: I) -> AHashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: AHashSet<String> = schemes
        .into_iter()
        .map(|s| s.as_ref().trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        names = DEFAULT_SCHEMES.iter().map(|s| (*s).to_string()).collect();
    }
    names
}

impl SchemeSet {
    /// Compiles the allow-list into a case-insensitive suffix automaton.
    pub fn compile<I, S>(schemes: I) -> Result<Self, UrlError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = normalize_names(schemes);
        let ac = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(suffixed_forms(&names))?;
        Ok(Self {
            names,
            lookup: SuffixLookup::Automaton(Arc::new(ac)),
        })
    }

    fn linear<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = normalize_names(schemes);
        let patterns = suffixed_forms(&names).into_iter().collect();
        Self {
            names,
            lookup: SuffixLookup::Linear(patterns),
        }
    }

    /// Configured scheme names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }

    /// Finds where an allowed scheme starts inside `candidate`, when the
    /// candidate ends with `scheme://` or `scheme%3a//`.
    ///
    /// The scheme name must be at the start of the candidate or follow a
    /// character that cannot be part of a scheme, so `url(https://` yields
    /// the offset of `https` while `xhttp://` yields nothing. The longest
    /// allowed suffix wins.
    pub fn find_suffix(&self, candidate: &str) -> Option<usize> {
        let at_boundary = |start: usize| {
            candidate[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !is_scheme_char(c))
        };

        match &self.lookup {
            SuffixLookup::Automaton(ac) => ac
                .find_overlapping_iter(candidate)
                .filter(|m| m.end() == candidate.len() && at_boundary(m.start()))
                .map(|m| m.start())
                .min(),
            SuffixLookup::Linear(patterns) => patterns
                .iter()
                .filter_map(|p| {
                    let start = candidate.len().checked_sub(p.len())?;
                    let tail = candidate.get(start..)?;
                    (tail.eq_ignore_ascii_case(p) && at_boundary(start)).then_some(start)
                })
                .min(),
        }
    }
}

impl Default for SchemeSet {
    fn default() -> Self {
        Self::compile(DEFAULT_SCHEMES).unwrap_or_else(|_| Self::linear(DEFAULT_SCHEMES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_candidates() {
        let set = SchemeSet::default();
        assert_eq!(set.find_suffix("http://"), Some(0));
        assert_eq!(set.find_suffix("HTTPS://"), Some(0));
        assert_eq!(set.find_suffix("ftp%3A//"), Some(0));
        assert_eq!(set.find_suffix("gopher://"), None);
        assert_eq!(set.find_suffix("http:/"), None);
    }

    #[test]
    fn dirty_prefix_is_skipped() {
        let set = SchemeSet::default();
        assert_eq!(set.find_suffix("url(https://"), Some(4));
        assert_eq!(set.find_suffix(":u(sftp://"), None);
        assert_eq!(set.find_suffix("xhttp://"), None);
        assert_eq!(set.find_suffix("\"ftps://"), Some(1));
    }

    #[test]
    fn linear_lookup_agrees_with_automaton() {
        let compiled = SchemeSet::default();
        let linear = SchemeSet::linear(DEFAULT_SCHEMES);
        for candidate in ["http://", "a(https://", "xftp://", "ftps%3a//", "mailto://", "", "//"] {
            assert_eq!(
                compiled.find_suffix(candidate),
                linear.find_suffix(candidate),
                "{candidate:?}"
            );
        }
    }

    #[test]
    fn membership_ignores_case() {
        let set = SchemeSet::default();
        assert!(set.contains("HTTP"));
        assert!(!set.contains("mailto"));
    }
}
