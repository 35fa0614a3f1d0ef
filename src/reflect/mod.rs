//! # Reflect Module
//!
//! Extracts the structural facts of a discovered PHP class without executing it.
//!
//! The source file is tokenized by [`lexer`] and walked by [`parser`]; this
//! module then applies the per-kind extraction rules:
//!
//! - **Enumerations** yield every class constant, in declaration order, with its
//!   value evaluated as a constant expression.
//! - **Objects** yield the endpoint returned by `getEndpoint()` and their
//!   connection methods. Three shapes of connection are recognised:
//!   - `$this->getManyByConnection(X::className(), $fields, $params, 'edge')`
//!     (or one of its siblings): the fourth argument is the endpoint;
//!   - the same call without a fourth argument: the endpoint is the one
//!     `getEndpoint()` of class `X` returns, looked up in the object root;
//!   - `new ApiRequest($api, $id, RequestInterface::METHOD_GET, '/edge', ...)`:
//!     the path without its leading `/`. Requests with any other HTTP method
//!     and requests on the node itself (`'/'`) are not connections.
//!
//! Constant expressions cover literals, unary minus, `.` concatenation,
//! parentheses and `self::`/`static::` references to constants declared
//! earlier in the same class. Anything that would need the PHP runtime to
//! resolve is rejected.

pub mod lexer;
pub mod parser;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::descriptor::{
    ClassDescriptor, ClassFacts, ConnectionKind, ConstantMap, DescriptorKind, KindMap,
    MethodDescriptor,
};
use crate::error::ConvertError;
use lexer::{Token, TokenKind};
use parser::{PhpClass, PhpMethod, Visibility};

/// Base-class calls that mark a method as a connection method
const CONNECTION_CALLS: &[(&str, ConnectionKind)] = &[
    ("getManyByConnection", ConnectionKind::Synchronous),
    ("getOneByConnection", ConnectionKind::Synchronous),
    ("getManyByConnectionAsync", ConnectionKind::Asynchronous),
    ("getOneByConnectionAsync", ConnectionKind::Asynchronous),
];

/// Zero-based position of the endpoint argument in a connection call
const ENDPOINT_ARGUMENT: usize = 3;

/// Zero-based positions of the HTTP method and path in `new ApiRequest(...)`
const REQUEST_METHOD_ARGUMENT: usize = 2;
const REQUEST_PATH_ARGUMENT: usize = 3;

/// Reads source files and extracts [`ClassFacts`] for descriptors
#[derive(Debug, Clone)]
pub struct Reflector {
    source_namespaces: KindMap<String>,
    object_root: Option<PathBuf>,
}

impl Reflector {
    /// Create a reflector that expects each kind's classes under the given PHP namespace
    ///
    /// An empty namespace disables the check for that kind.
    pub fn new(source_namespaces: KindMap<String>) -> Self {
        Reflector {
            source_namespaces,
            object_root: None,
        }
    }

    /// Directory holding the object classes, used to resolve connections that
    /// only name the class they return (`X::className()` without an endpoint)
    ///
    /// Without it such connections are dropped.
    pub fn with_object_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.object_root = Some(root.into());
        self
    }

    /// Read the descriptor's source file and extract its facts
    pub fn reflect(&self, descriptor: &ClassDescriptor) -> Result<ClassFacts, ConvertError> {
        let source = fs::read_to_string(&descriptor.source_file).map_err(|e| {
            ConvertError::reflection(&descriptor.source_file, format!("cannot read file: {e}"))
        })?;
        self.reflect_source(descriptor, &source)
    }

    /// Extract facts from already loaded source text
    pub fn reflect_source(
        &self,
        descriptor: &ClassDescriptor,
        source: &str,
    ) -> Result<ClassFacts, ConvertError> {
        let path = &descriptor.source_file;
        let file = parser::parse_source(source)
            .map_err(|e| ConvertError::reflection(path, format!("syntax error at {e}")))?;

        let expected = normalize_namespace(self.source_namespaces.get(descriptor.kind));
        let found = normalize_namespace(file.namespace.as_deref().unwrap_or(""));
        if !expected.is_empty() && !expected.eq_ignore_ascii_case(found) {
            warn!(
                file = %path.display(),
                expected = %expected,
                found = %found,
                "Source namespace does not match the configured namespace"
            );
        }

        let class = file.class(&descriptor.short_name).ok_or_else(|| {
            ConvertError::reflection(path, format!("no class `{}` in file", descriptor.short_name))
        })?;

        let facts = match descriptor.kind {
            DescriptorKind::Object => self.object_facts(class),
            DescriptorKind::FieldEnumeration | DescriptorKind::ValueEnumeration => {
                let constants = enumeration_constants(class)
                    .map_err(|reason| ConvertError::reflection(path, reason))?;
                ClassFacts::Enumeration { constants }
            }
        };
        debug!(
            class = %descriptor.short_name,
            kind = %descriptor.kind,
            "Reflected class"
        );
        Ok(facts)
    }
}

fn normalize_namespace(namespace: &str) -> &str {
    namespace.trim_matches('\\')
}

fn enumeration_constants(class: &PhpClass) -> Result<ConstantMap, String> {
    let mut constants = ConstantMap::new();
    for constant in &class.constants {
        let value = evaluate(&constant.value, &class.name, &constants).map_err(|reason| {
            format!("constant {} (line {}): {}", constant.name, constant.line, reason)
        })?;
        constants.insert(&constant.name, value).map_err(|name| {
            format!("constant {} (line {}) is declared twice", name, constant.line)
        })?;
    }
    Ok(constants)
}

/// Constants of an object class, skipping those that cannot be evaluated
///
/// They are only needed to resolve `self::` references, so the first
/// declaration of a name wins and anything unresolvable is left out.
fn lenient_constants(class: &PhpClass) -> ConstantMap {
    let mut constants = ConstantMap::new();
    for constant in &class.constants {
        let Ok(value) = evaluate(&constant.value, &class.name, &constants) else {
            continue;
        };
        if let Err(name) = constants.insert(&constant.name, value) {
            debug!(class = %class.name, constant = %name, "Ignoring redeclared constant");
        }
    }
    constants
}

impl Reflector {
    fn object_facts(&self, class: &PhpClass) -> ClassFacts {
        let constants = lenient_constants(class);

        let endpoint = endpoint(class, &constants);
        if endpoint.is_none() {
            debug!(class = %class.name, "getEndpoint() does not return a constant expression");
        }

        let mut referenced = HashMap::new();
        let methods = class
            .methods
            .iter()
            .filter(|m| is_connection_candidate(m))
            .filter_map(|m| {
                self.connection_method(class, m, &constants, endpoint.as_deref(), &mut referenced)
            })
            .collect();

        ClassFacts::Object { endpoint, methods }
    }

    fn connection_method(
        &self,
        class: &PhpClass,
        method: &PhpMethod,
        constants: &ConstantMap,
        own_endpoint: Option<&str>,
        referenced: &mut HashMap<String, Option<String>>,
    ) -> Option<MethodDescriptor> {
        let body = method.body.as_deref()?;
        let (connection_kind, resolved) = if let Some((kind, args)) = find_connection_call(body) {
            let resolved = match args.get(ENDPOINT_ARGUMENT) {
                Some(arg) => evaluate(arg, &class.name, constants),
                None => self.referenced_endpoint(class, args.first().copied(), own_endpoint, referenced),
            };
            (kind, resolved)
        } else if let Some(args) = find_api_request(body) {
            (
                ConnectionKind::Synchronous,
                request_endpoint(class, &args, constants),
            )
        } else {
            return None;
        };

        let connection_endpoint = match resolved {
            Ok(value) => value,
            Err(reason) => {
                debug!(
                    class = %class.name,
                    method = %method.name,
                    reason = %reason,
                    "Dropping connection method with unresolvable endpoint"
                );
                return None;
            }
        };

        Some(MethodDescriptor {
            name: ucfirst(&method.name),
            connection_endpoint: Some(connection_endpoint),
            documentation: documentation(method),
            connection_kind,
        })
    }

    /// Endpoint of the class named by a connection's first argument
    fn referenced_endpoint(
        &self,
        class: &PhpClass,
        reference: Option<&[Token]>,
        own_endpoint: Option<&str>,
        referenced: &mut HashMap<String, Option<String>>,
    ) -> Result<String, String> {
        let target = reference
            .and_then(referenced_class)
            .ok_or("no endpoint argument and no referenced class")?;
        let own = target.eq_ignore_ascii_case("self")
            || target.eq_ignore_ascii_case("static")
            || target == class.name;
        let endpoint = if own {
            own_endpoint.map(str::to_string)
        } else {
            referenced
                .entry(target.to_string())
                .or_insert_with(|| self.object_endpoint(target))
                .clone()
        };
        match endpoint {
            Some(endpoint) if !endpoint.is_empty() => Ok(endpoint),
            _ => Err(format!("endpoint of referenced class {target} is unknown")),
        }
    }

    /// Literal endpoint of another object class, read from the object root
    fn object_endpoint(&self, name: &str) -> Option<String> {
        let path = self.object_root.as_ref()?.join(format!("{name}.php"));
        let source = fs::read_to_string(&path).ok()?;
        let file = parser::parse_source(&source).ok()?;
        let class = file.class(name)?;
        endpoint(class, &lenient_constants(class))
    }
}

fn endpoint(class: &PhpClass, constants: &ConstantMap) -> Option<String> {
    let Some(method) = class.method("getEndpoint") else {
        return Some(String::new());
    };
    match method.body.as_deref()? {
        [ret, expr @ .., end] if ret.is_name("return") && end.is_punct(';') => {
            evaluate(expr, &class.name, constants).ok()
        }
        _ => None,
    }
}

fn is_connection_candidate(method: &PhpMethod) -> bool {
    method.visibility == Visibility::Public
        && !method.is_static
        && method.body.is_some()
        && !method.name.eq_ignore_ascii_case("getEndpoint")
        && !method.name.starts_with("__")
}

/// Last segment of a possibly backslash-qualified name
fn unqualified(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

/// `X::className()` or `X::class`
fn referenced_class(tokens: &[Token]) -> Option<&str> {
    match tokens {
        [scope, colons, name, open, close]
            if colons.kind == TokenKind::DoubleColon
                && name.is_name("className")
                && open.is_punct('(')
                && close.is_punct(')') =>
        {
            scope.name().map(unqualified)
        }
        [scope, colons, name] if colons.kind == TokenKind::DoubleColon && name.is_name("class") => {
            scope.name().map(unqualified)
        }
        _ => None,
    }
}

/// Find the first `new ApiRequest(...)` and split its arguments
fn find_api_request(body: &[Token]) -> Option<Vec<&[Token]>> {
    body.windows(3).enumerate().find_map(|(i, window)| {
        let [new, class, open] = window else {
            return None;
        };
        if !new.is_name("new") || !open.is_punct('(') {
            return None;
        }
        let name = class.name()?;
        unqualified(name)
            .eq_ignore_ascii_case("ApiRequest")
            .then(|| split_arguments(&body[i + 3..]))
    })
}

/// Connection endpoint of an `ApiRequest`: the GET path without its leading `/`
fn request_endpoint(
    class: &PhpClass,
    args: &[&[Token]],
    constants: &ConstantMap,
) -> Result<String, String> {
    let method = args
        .get(REQUEST_METHOD_ARGUMENT)
        .ok_or("request has no HTTP method argument")?;
    if !is_get_method(method) {
        return Err("request is not a GET".to_string());
    }
    let path = args
        .get(REQUEST_PATH_ARGUMENT)
        .ok_or("request has no path argument")?;
    let path = evaluate(path, &class.name, constants)?;
    let edge = path.trim_start_matches('/');
    if edge.is_empty() {
        return Err("request targets the node itself".to_string());
    }
    Ok(edge.to_string())
}

/// `RequestInterface::METHOD_GET` or the literal `'GET'`
fn is_get_method(tokens: &[Token]) -> bool {
    match tokens {
        [scope, colons, name] if colons.kind == TokenKind::DoubleColon => {
            scope
                .name()
                .is_some_and(|s| unqualified(s).eq_ignore_ascii_case("RequestInterface"))
                && name.is_name("METHOD_GET")
        }
        [single] => matches!(&single.kind, TokenKind::Str(s) if s.eq_ignore_ascii_case("GET")),
        _ => false,
    }
}

/// Find the first `$this->...ByConnection(...)` call and split its arguments
fn find_connection_call(body: &[Token]) -> Option<(ConnectionKind, Vec<&[Token]>)> {
    body.windows(4).enumerate().find_map(|(i, window)| {
        let [this, arrow, name, open] = window else {
            return None;
        };
        if this.kind != TokenKind::Variable("this".into())
            || arrow.kind != TokenKind::Arrow
            || !open.is_punct('(')
        {
            return None;
        }
        let called = name.name()?;
        let (_, kind) = CONNECTION_CALLS
            .iter()
            .find(|(call, _)| call.eq_ignore_ascii_case(called))?;
        Some((*kind, split_arguments(&body[i + 4..])))
    })
}

/// Split the arguments of a call whose opening parenthesis was just consumed
fn split_arguments(tokens: &[Token]) -> Vec<&[Token]> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Punct('(' | '[' | '{') => depth += 1,
            TokenKind::Punct(')' | ']' | '}') if depth == 0 => {
                if i > start {
                    args.push(&tokens[start..i]);
                }
                return args;
            }
            TokenKind::Punct(')' | ']' | '}') => depth -= 1,
            TokenKind::Punct(',') if depth == 0 => {
                args.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    args
}

/// Upper-case the first letter: `getAds` → `GetAds`
pub fn ucfirst(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One-line description of a method, from its doc comment or its name
pub fn documentation(method: &PhpMethod) -> String {
    method
        .doc
        .as_deref()
        .and_then(doc_summary)
        .unwrap_or_else(|| humanize(&method.name))
}

fn doc_summary(doc: &str) -> Option<String> {
    let inner = doc
        .trim_start_matches("/**")
        .trim_end_matches("*/");
    let mut summary = Vec::new();
    for line in inner.lines() {
        let line = line.trim().trim_start_matches('*').trim();
        if line.starts_with('@') {
            break;
        }
        if line.is_empty() {
            if summary.is_empty() {
                continue;
            }
            break;
        }
        summary.push(line);
    }
    let text = summary.join(" ");
    let text = text.trim_end_matches('.').trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Turn a camelCase method name into a sentence: `getAdSets` → `Get ad sets`
pub fn humanize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c == '_' {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
            prev = Some(c);
            continue;
        }
        let boundary = match prev {
            Some(p) => c.is_uppercase() && (p.is_lowercase() || p.is_ascii_digit()),
            None => false,
        };
        if boundary {
            out.push(' ');
        }
        if out.is_empty() {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        prev = Some(c);
    }
    out.trim_end().to_string()
}

/// Evaluate a constant expression to the string PHP would print for it
fn evaluate(tokens: &[Token], class: &str, known: &ConstantMap) -> Result<String, String> {
    let mut eval = Evaluator {
        tokens,
        pos: 0,
        class,
        known,
    };
    let value = eval.concat()?;
    match eval.tokens.get(eval.pos) {
        None => Ok(value),
        Some(token) => Err(format!("unsupported expression near {}", describe(token))),
    }
}

struct Evaluator<'a> {
    tokens: &'a [Token],
    pos: usize,
    class: &'a str,
    known: &'a ConstantMap,
}

impl<'a> Evaluator<'a> {
    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn concat(&mut self) -> Result<String, String> {
        let mut value = self.term()?;
        while self.tokens.get(self.pos).is_some_and(|t| t.is_punct('.')) {
            self.pos += 1;
            value.push_str(&self.term()?);
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<String, String> {
        let token = self.next().ok_or("expression ends unexpectedly")?;
        match &token.kind {
            TokenKind::Str(s) => Ok(s.clone()),
            TokenKind::Number(n) => number(n),
            TokenKind::Punct('-') => match self.next().map(|t| &t.kind) {
                Some(TokenKind::Number(n)) => {
                    let value = number(n)?;
                    Ok(if value == "0" { value } else { format!("-{value}") })
                }
                _ => Err("unary minus is only supported on numbers".to_string()),
            },
            TokenKind::Punct('+') => match self.next().map(|t| &t.kind) {
                Some(TokenKind::Number(n)) => number(n),
                _ => Err("unary plus is only supported on numbers".to_string()),
            },
            TokenKind::Punct('(') => {
                let value = self.concat()?;
                match self.next() {
                    Some(t) if t.is_punct(')') => Ok(value),
                    _ => Err("unbalanced parentheses".to_string()),
                }
            }
            TokenKind::Name(_) if token.is_name("true") => Ok("1".to_string()),
            TokenKind::Name(_) if token.is_name("false") || token.is_name("null") => {
                Ok(String::new())
            }
            TokenKind::Name(scope) => self.class_constant(scope),
            _ => Err(format!("unsupported expression near {}", describe(token))),
        }
    }

    fn class_constant(&mut self, scope: &str) -> Result<String, String> {
        let name = match (self.next(), self.next()) {
            (Some(colons), Some(name)) if colons.kind == TokenKind::DoubleColon => name
                .name()
                .ok_or_else(|| format!("unsupported expression near {}", describe(name)))?,
            _ => return Err(format!("reference to global constant {scope}")),
        };
        let short_scope = scope.rsplit('\\').next().unwrap_or(scope);
        let own = scope.eq_ignore_ascii_case("self")
            || scope.eq_ignore_ascii_case("static")
            || short_scope == self.class;
        if !own {
            return Err(format!("reference to external constant {scope}::{name}"));
        }
        self.known
            .get(name)
            .map(str::to_string)
            .ok_or_else(|| format!("reference to undefined constant {name}"))
    }
}

fn describe(token: &Token) -> String {
    match &token.kind {
        TokenKind::Name(n) => format!("`{n}`"),
        TokenKind::Variable(v) => format!("`${v}`"),
        TokenKind::Str(_) => "a string".to_string(),
        TokenKind::Number(n) => format!("`{n}`"),
        TokenKind::DocComment(_) => "a comment".to_string(),
        TokenKind::Arrow => "`->`".to_string(),
        TokenKind::DoubleColon => "`::`".to_string(),
        TokenKind::DoubleArrow => "`=>`".to_string(),
        TokenKind::Punct(c) => format!("`{c}`"),
    }
}

/// Normalise a PHP numeric literal to its printed decimal form
fn number(raw: &str) -> Result<String, String> {
    let digits: String = raw.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let radix = if let Some(hex) = lower.strip_prefix("0x") {
        Some((hex.to_string(), 16))
    } else if let Some(bin) = lower.strip_prefix("0b") {
        Some((bin.to_string(), 2))
    } else if let Some(oct) = lower.strip_prefix("0o") {
        Some((oct.to_string(), 8))
    } else if lower.len() > 1 && lower.starts_with('0') && lower.chars().all(|c| c.is_ascii_digit()) {
        Some((lower[1..].to_string(), 8))
    } else {
        None
    };
    if let Some((body, radix)) = radix {
        return u64::from_str_radix(&body, radix)
            .map(|v| v.to_string())
            .map_err(|_| format!("invalid number `{raw}`"));
    }
    if lower.chars().all(|c| c.is_ascii_digit()) {
        let trimmed = lower.trim_start_matches('0');
        return Ok(if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() });
    }
    lower
        .parse::<f64>()
        .map(|v| v.to_string())
        .map_err(|_| format!("invalid number `{raw}`"))
}
