//! 형식별 구현체

pub mod cyclonedx_json;
pub mod cyclonedx_xml;
pub mod packhorse_json;
pub mod spdx_json;
pub mod spdx_tag_value;
pub mod table;

pub use cyclonedx_json::CycloneDxJsonFormat;
pub use cyclonedx_xml::CycloneDxXmlFormat;
pub use packhorse_json::PackhorseJsonFormat;
pub use spdx_json::SpdxJsonFormat;
pub use spdx_tag_value::SpdxTagValueFormat;
pub use table::TableFormat;
