use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Structural category of a discovered class
///
/// Decides which extraction rules the reflector applies, which template the
/// renderer picks and which output directory the writer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    /// API object with an endpoint and connection methods
    Object,
    /// Class of string constants naming the fields of an object
    FieldEnumeration,
    /// Class of string constants enumerating allowed values
    ValueEnumeration,
}

impl DescriptorKind {
    /// All kinds, in the order the converter scans their roots
    pub const ALL: [DescriptorKind; 3] = [
        DescriptorKind::Object,
        DescriptorKind::FieldEnumeration,
        DescriptorKind::ValueEnumeration,
    ];

    /// Short key used in configuration tables and log fields
    pub fn key(self) -> &'static str {
        match self {
            DescriptorKind::Object => "object",
            DescriptorKind::FieldEnumeration => "fields",
            DescriptorKind::ValueEnumeration => "values",
        }
    }

    /// Parse a configuration key (`object`, `fields`, `values`)
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "object" => Some(DescriptorKind::Object),
            "fields" => Some(DescriptorKind::FieldEnumeration),
            "values" => Some(DescriptorKind::ValueEnumeration),
            _ => None,
        }
    }

    /// Whether descriptors of this kind carry constants
    pub fn is_enumeration(self) -> bool {
        !matches!(self, DescriptorKind::Object)
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One value per [`DescriptorKind`]
///
/// Used for every per-kind setting (input roots, output directories,
/// namespaces) so that kind dispatch stays a plain field match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindMap<T> {
    /// Value for [`DescriptorKind::Object`]
    pub object: T,
    /// Value for [`DescriptorKind::FieldEnumeration`]
    pub fields: T,
    /// Value for [`DescriptorKind::ValueEnumeration`]
    pub values: T,
}

impl<T> KindMap<T> {
    /// Build a map from a function of the kind
    pub fn from_fn(mut f: impl FnMut(DescriptorKind) -> T) -> Self {
        KindMap {
            object: f(DescriptorKind::Object),
            fields: f(DescriptorKind::FieldEnumeration),
            values: f(DescriptorKind::ValueEnumeration),
        }
    }

    /// Value for `kind`
    pub fn get(&self, kind: DescriptorKind) -> &T {
        match kind {
            DescriptorKind::Object => &self.object,
            DescriptorKind::FieldEnumeration => &self.fields,
            DescriptorKind::ValueEnumeration => &self.values,
        }
    }

    /// Mutable value for `kind`
    pub fn get_mut(&mut self, kind: DescriptorKind) -> &mut T {
        match kind {
            DescriptorKind::Object => &mut self.object,
            DescriptorKind::FieldEnumeration => &mut self.fields,
            DescriptorKind::ValueEnumeration => &mut self.values,
        }
    }

    /// Transform every value
    pub fn map<U>(self, mut f: impl FnMut(DescriptorKind, T) -> U) -> KindMap<U> {
        KindMap {
            object: f(DescriptorKind::Object, self.object),
            fields: f(DescriptorKind::FieldEnumeration, self.fields),
            values: f(DescriptorKind::ValueEnumeration, self.values),
        }
    }
}

/// Which base-class fetch call a generated method forwards to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Blocking fetch
    Synchronous,
    /// Task-returning fetch
    Asynchronous,
}

impl ConnectionKind {
    /// Name of the base CRUD member the generated method calls
    pub fn target_call(self) -> &'static str {
        match self {
            ConnectionKind::Synchronous => "GetManyByConnection",
            ConnectionKind::Asynchronous => "GetManyByConnectionAsync",
        }
    }
}

/// A connection method discovered on an object class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    /// Identifier of the generated method
    pub name: String,
    /// Remote endpoint the method is bound to; `None` means not API-callable
    pub connection_endpoint: Option<String>,
    /// One-line description emitted as the method's summary comment
    pub documentation: String,
    /// Fetch flavour the method forwards to
    pub connection_kind: ConnectionKind,
}

/// Constant name → value mapping that keeps declaration order
///
/// Names are unique; [`ConstantMap::insert`] rejects a second declaration of
/// the same name instead of overwriting it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConstantMap {
    entries: Vec<(String, String)>,
}

impl ConstantMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a constant, failing with the name if it is already present
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<(), String> {
        let name = name.into();
        if self.contains(&name) {
            return Err(name);
        }
        self.entries.push((name, value.into()));
        Ok(())
    }

    /// Whether a constant named `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Value of the constant named `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Constants in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Constant names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Number of constants
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no constants
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Facts the reflector extracted from a source class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ClassFacts {
    /// Facts for [`DescriptorKind::Object`]
    Object {
        /// REST path segment; `Some("")` is a valid empty endpoint, `None` is undefined
        endpoint: Option<String>,
        /// Connection methods in discovery order
        methods: Vec<MethodDescriptor>,
    },
    /// Facts for the two enumeration kinds
    Enumeration {
        /// Declared constants in declaration order
        constants: ConstantMap,
    },
}

/// The unit of work: one discovered input class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDescriptor {
    /// Target namespace the generated class is placed under
    pub namespace: String,
    /// Fully-qualified source class name (e.g. `\FacebookAds\Object\Campaign`)
    pub qualified_name: String,
    /// Class name, derived from the file name
    pub short_name: String,
    /// Structural category
    pub kind: DescriptorKind,
    /// Input file the class is reflected from
    pub source_file: PathBuf,
    /// Reflected facts; `None` until the reflector has run
    pub facts: Option<ClassFacts>,
}

impl ClassDescriptor {
    /// Create an unreflected descriptor
    pub fn new(
        kind: DescriptorKind,
        short_name: impl Into<String>,
        namespace: impl Into<String>,
        qualified_name: impl Into<String>,
        source_file: impl Into<PathBuf>,
    ) -> Self {
        ClassDescriptor {
            namespace: namespace.into(),
            qualified_name: qualified_name.into(),
            short_name: short_name.into(),
            kind,
            source_file: source_file.into(),
            facts: None,
        }
    }

    /// Attach reflected facts
    pub fn with_facts(mut self, facts: ClassFacts) -> Self {
        self.facts = Some(facts);
        self
    }

    /// Endpoint of an object descriptor
    pub fn endpoint(&self) -> Option<&str> {
        match &self.facts {
            Some(ClassFacts::Object { endpoint, .. }) => endpoint.as_deref(),
            _ => None,
        }
    }

    /// Connection methods of an object descriptor (empty for other kinds)
    pub fn methods(&self) -> &[MethodDescriptor] {
        match &self.facts {
            Some(ClassFacts::Object { methods, .. }) => methods,
            _ => &[],
        }
    }

    /// Constants of an enumeration descriptor
    pub fn constants(&self) -> Option<&ConstantMap> {
        match &self.facts {
            Some(ClassFacts::Enumeration { constants }) => Some(constants),
            _ => None,
        }
    }

    /// Target-language fully-qualified name of the generated class
    pub fn target_name(&self) -> String {
        if self.namespace.is_empty() {
            self.short_name.clone()
        } else {
            format!("{}.{}", self.namespace, self.short_name)
        }
    }
}
