use crate::{DetectorConfig, DetectorOptions, NormalizedUrl, Url, UrlDetector};
use pyo3::prelude::*;
use pyo3::types::PyDict;

fn build_config(options: u32, schemes: Option<Vec<String>>) -> PyResult<DetectorConfig> {
    let options = DetectorOptions::from_bits_retain(options);
    match schemes {
        Some(names) => Ok(DetectorConfig::with_schemes(options, names)?),
        None => Ok(DetectorConfig::new(options)),
    }
}

fn url_to_dict<'py>(py: Python<'py>, url: &Url) -> PyResult<&'py PyDict> {
    let dict = PyDict::new(py);
    dict.set_item("url", url.original_url())?;
    dict.set_item("scheme", url.scheme())?;
    dict.set_item("username", url.username())?;
    dict.set_item("password", url.password())?;
    dict.set_item("host", url.host())?;
    dict.set_item("port", url.port())?;
    dict.set_item("path", url.path())?;
    dict.set_item("query", url.query())?;
    dict.set_item("fragment", url.fragment())?;
    Ok(dict)
}

/// 在文本中查找 URL，返回匹配到的原始字符串
#[pyfunction]
#[pyo3(signature = (text, options = 0, schemes = None))]
fn detect_urls(text: &str, options: u32, schemes: Option<Vec<String>>) -> PyResult<Vec<String>> {
    let detector = UrlDetector::new(build_config(options, schemes)?);
    Ok(detector
        .detect(text)
        .iter()
        .map(|u| u.original_url().to_string())
        .collect())
}

/// 单个 URL 的规范化形式
#[pyfunction]
fn normalize_url(text: &str) -> PyResult<String> {
    Ok(NormalizedUrl::create(text)?.full_url())
}

/// 可复用的检测器，配置只编译一次
#[pyclass(name = "UrlDetector")]
struct PyUrlDetector {
    inner: UrlDetector,
}

#[pymethods]
impl PyUrlDetector {
    #[new]
    #[pyo3(signature = (options = 0, schemes = None))]
    fn new(options: u32, schemes: Option<Vec<String>>) -> PyResult<Self> {
        Ok(PyUrlDetector {
            inner: UrlDetector::new(build_config(options, schemes)?),
        })
    }

    fn detect<'py>(&self, py: Python<'py>, text: &str) -> PyResult<Vec<&'py PyDict>> {
        self.inner
            .detect(text)
            .iter()
            .map(|url| url_to_dict(py, url))
            .collect()
    }

    fn schemes(&self) -> Vec<String> {
        self.inner
            .config()
            .schemes
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

#[pymodule]
fn url_detector(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(detect_urls, m)?)?;
    m.add_function(wrap_pyfunction!(normalize_url, m)?)?;
    m.add_class::<PyUrlDetector>()?;
    m.add("QUOTE_MATCH", DetectorOptions::QUOTE_MATCH.bits())?;
    m.add("SINGLE_QUOTE_MATCH", DetectorOptions::SINGLE_QUOTE_MATCH.bits())?;
    m.add("BRACKET_MATCH", DetectorOptions::BRACKET_MATCH.bits())?;
    m.add("XML", DetectorOptions::XML.bits())?;
    m.add("ALLOW_SINGLE_LEVEL_DOMAIN", DetectorOptions::ALLOW_SINGLE_LEVEL_DOMAIN.bits())?;
    m.add("JSON", DetectorOptions::JSON.bits())?;
    m.add("JAVASCRIPT", DetectorOptions::JAVASCRIPT.bits())?;
    m.add("HTML", DetectorOptions::HTML.bits())?;
    Ok(())
}
