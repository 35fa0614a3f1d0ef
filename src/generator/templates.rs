use askama::Template;
use chrono::NaiveDateTime;

use crate::config::HeaderConfig;
use crate::descriptor::{ClassDescriptor, ClassFacts, DescriptorKind};
use crate::error::ConvertError;

/// Format of the `<date>` line in the generated header
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Values the shared header block is rendered from
#[derive(Debug, Clone)]
pub struct HeaderView {
    /// `using` directives, without the keyword
    pub usings: Vec<String>,
    /// Banner lines, already prefixed with `///`
    pub banner: Vec<String>,
    /// Formatted generation timestamp
    pub generated_at: String,
    /// Fully-qualified source class name
    pub source_class: String,
}

/// One generated connection method
#[derive(Debug, Clone)]
pub struct MethodView {
    /// Method identifier
    pub name: String,
    /// Single-line summary, XML-escaped
    pub documentation: String,
    /// Base-class member the method forwards to
    pub target_call: &'static str,
    /// Escaped endpoint literal content
    pub endpoint: String,
}

/// One generated string constant
#[derive(Debug, Clone)]
pub struct ConstantView {
    /// Constant identifier
    pub name: String,
    /// Escaped literal content
    pub value: String,
}

/// Template data for an object class
#[derive(Template)]
#[template(path = "object.cs.txt", escape = "none")]
pub struct ObjectTemplateData {
    /// Shared header
    pub header: HeaderView,
    /// Target namespace
    pub namespace: String,
    /// Generated class name
    pub class_name: String,
    /// Base CRUD type
    pub base_class: String,
    /// Escaped endpoint literal content
    pub endpoint: String,
    /// Methods in discovery order
    pub methods: Vec<MethodView>,
}

/// Template data for a field or value enumeration class
#[derive(Template)]
#[template(path = "enumeration.cs.txt", escape = "none")]
pub struct EnumerationTemplateData {
    /// Shared header
    pub header: HeaderView,
    /// Target namespace
    pub namespace: String,
    /// Generated class name
    pub class_name: String,
    /// Base enumeration type
    pub base_class: String,
    /// Constants in stored order
    pub constants: Vec<ConstantView>,
}

/// Turns reflected descriptors into C# source text
///
/// Rendering is a pure function of the descriptor and the timestamp passed in;
/// the timestamp only appears on the header's `<date>` line.
#[derive(Debug, Clone)]
pub struct Renderer {
    object_base: String,
    enumeration_base: String,
    header: HeaderConfig,
}

impl Renderer {
    /// Create a renderer with the given base types and header settings
    pub fn new(
        object_base: impl Into<String>,
        enumeration_base: impl Into<String>,
        header: HeaderConfig,
    ) -> Self {
        Renderer {
            object_base: object_base.into(),
            enumeration_base: enumeration_base.into(),
            header,
        }
    }

    /// Render `descriptor` with `generated_at` on the header's date line
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Template`] if the descriptor was never reflected,
    /// carries facts of the wrong shape for its kind, has an undefined endpoint,
    /// or if template rendering fails.
    pub fn render(
        &self,
        descriptor: &ClassDescriptor,
        generated_at: NaiveDateTime,
    ) -> Result<String, ConvertError> {
        let class_name = &descriptor.short_name;
        let facts = descriptor
            .facts
            .as_ref()
            .ok_or_else(|| ConvertError::template(class_name, "descriptor has not been reflected"))?;
        let header = self.header_view(descriptor, generated_at);

        let rendered = match (descriptor.kind, facts) {
            (DescriptorKind::Object, ClassFacts::Object { endpoint, methods }) => {
                let endpoint = endpoint
                    .as_deref()
                    .ok_or_else(|| ConvertError::template(class_name, "endpoint is undefined"))?;
                let methods = methods
                    .iter()
                    .filter_map(|m| {
                        let endpoint = m.connection_endpoint.as_deref()?;
                        Some(MethodView {
                            name: m.name.clone(),
                            documentation: xml_escape(&single_line(&m.documentation)),
                            target_call: m.connection_kind.target_call(),
                            endpoint: csharp_escape(endpoint),
                        })
                    })
                    .collect();
                ObjectTemplateData {
                    header,
                    namespace: descriptor.namespace.clone(),
                    class_name: class_name.clone(),
                    base_class: self.object_base.clone(),
                    endpoint: csharp_escape(endpoint),
                    methods,
                }
                .render()
            }
            (
                DescriptorKind::FieldEnumeration | DescriptorKind::ValueEnumeration,
                ClassFacts::Enumeration { constants },
            ) => EnumerationTemplateData {
                header,
                namespace: descriptor.namespace.clone(),
                class_name: class_name.clone(),
                base_class: self.enumeration_base.clone(),
                constants: constants
                    .iter()
                    .map(|(name, value)| ConstantView {
                        name: name.to_string(),
                        value: csharp_escape(value),
                    })
                    .collect(),
            }
            .render(),
            (kind, _) => {
                return Err(ConvertError::template(
                    class_name,
                    format!("reflected facts do not match kind '{kind}'"),
                ))
            }
        };
        rendered.map_err(|e| ConvertError::template(class_name, e.to_string()))
    }

    fn header_view(&self, descriptor: &ClassDescriptor, generated_at: NaiveDateTime) -> HeaderView {
        let mut banner: Vec<String> = self.header.copyright.iter().map(|l| doc_line(l)).collect();
        if !banner.is_empty() && !self.header.license.is_empty() {
            banner.push(doc_line(""));
        }
        banner.extend(self.header.license.iter().map(|l| doc_line(l)));
        HeaderView {
            usings: self.header.usings.clone(),
            banner,
            generated_at: generated_at.format(TIMESTAMP_FORMAT).to_string(),
            source_class: descriptor.qualified_name.clone(),
        }
    }
}

fn doc_line(text: &str) -> String {
    if text.is_empty() {
        "///".to_string()
    } else {
        format!("/// {}", xml_escape(&single_line(text)))
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape `text` for use inside a C# regular string literal
pub fn csharp_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Escape `text` for use inside an XML documentation comment
pub fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
