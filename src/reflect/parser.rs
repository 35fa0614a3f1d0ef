//! Structural PHP class parser
//!
//! Walks the token stream and records, for every class declared in the file,
//! its constants and methods in declaration order. Expressions and method
//! bodies are kept as raw token runs; nothing is evaluated here.

use super::lexer::{tokenize, SyntaxError, Token, TokenKind};

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// `public` or no modifier
    Public,
    /// `protected`
    Protected,
    /// `private`
    Private,
}

/// A `const NAME = expr` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpConstant {
    /// Constant name
    pub name: String,
    /// Initializer tokens
    pub value: Vec<Token>,
    /// Line of the name
    pub line: usize,
}

/// A method declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpMethod {
    /// Method name as written
    pub name: String,
    /// Raw doc comment immediately preceding the declaration
    pub doc: Option<String>,
    /// Declared visibility
    pub visibility: Visibility,
    /// `static` modifier present
    pub is_static: bool,
    /// Body tokens between the braces; `None` for abstract methods
    pub body: Option<Vec<Token>>,
    /// Line of the name
    pub line: usize,
}

/// A class declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpClass {
    /// Class name
    pub name: String,
    /// `abstract` modifier present
    pub is_abstract: bool,
    /// Parent class, as written
    pub extends: Option<String>,
    /// Implemented interfaces, as written
    pub implements: Vec<String>,
    /// Constants in declaration order
    pub constants: Vec<PhpConstant>,
    /// Methods in declaration order
    pub methods: Vec<PhpMethod>,
    /// Line of the `class` keyword
    pub line: usize,
}

impl PhpClass {
    /// Look a method up by name (PHP method names are case-insensitive)
    pub fn method(&self, name: &str) -> Option<&PhpMethod> {
        self.methods.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

/// Everything the parser extracted from one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhpFile {
    /// Declared namespace, without a leading backslash
    pub namespace: Option<String>,
    /// Declared classes in file order
    pub classes: Vec<PhpClass>,
}

impl PhpFile {
    /// Find the class called `name` (class names compare case-sensitively here)
    pub fn class(&self, name: &str) -> Option<&PhpClass> {
        self.classes.iter().find(|c| c.name == name)
    }
}

/// Tokenize and parse a PHP source file
pub fn parse_source(source: &str) -> Result<PhpFile, SyntaxError> {
    let tokens = tokenize(source)?;
    parse_tokens(&tokens)
}

/// Parse an already tokenized PHP file
pub fn parse_tokens(tokens: &[Token]) -> Result<PhpFile, SyntaxError> {
    Parser { tokens, pos: 0 }.file()
}

const MODIFIERS: &[&str] = &[
    "public", "protected", "private", "static", "abstract", "final", "var", "readonly",
];

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    fn prev(&self) -> Option<&'a Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    fn line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn expect_name(&mut self, what: &str) -> Result<(String, usize), SyntaxError> {
        let line = self.line();
        match self.next() {
            Some(Token {
                kind: TokenKind::Name(name),
                line,
            }) => Ok((name.clone(), *line)),
            _ => Err(SyntaxError::new(line, format!("expected {what}"))),
        }
    }

    fn file(mut self) -> Result<PhpFile, SyntaxError> {
        let mut file = PhpFile::default();
        while let Some(token) = self.peek() {
            let after_scope = matches!(
                self.prev().map(|t| &t.kind),
                Some(TokenKind::DoubleColon) | Some(TokenKind::Arrow)
            );
            let declares = self.peek_at(1).is_some_and(|t| t.name().is_some());
            if token.is_name("namespace") && declares && !after_scope {
                self.pos += 1;
                let (name, _) = self.expect_name("namespace name")?;
                file.namespace = Some(name.trim_start_matches('\\').to_string());
            } else if token.is_name("class") && declares && !after_scope {
                let is_abstract = self.prev().is_some_and(|t| t.is_name("abstract"))
                    || (self.prev().is_some_and(|t| t.is_name("final") || t.is_name("readonly"))
                        && self.pos >= 2
                        && self.tokens[self.pos - 2].is_name("abstract"));
                file.classes.push(self.class(is_abstract)?);
            } else if (token.is_name("interface") || token.is_name("trait") || token.is_name("enum"))
                && declares
                && !after_scope
            {
                self.skip_to_block()?;
            } else if token.is_name("function") && !after_scope {
                self.pos += 1;
                self.function_tail()?;
            } else {
                self.pos += 1;
            }
        }
        Ok(file)
    }

    /// Advance to the next `{` and skip the block it opens
    fn skip_to_block(&mut self) -> Result<(), SyntaxError> {
        while let Some(token) = self.peek() {
            if token.is_punct('{') {
                self.skip_balanced()?;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(SyntaxError::new(self.line(), "expected '{'"))
    }

    /// With the cursor on an opening bracket, move past its matching close and
    /// return the tokens in between
    fn skip_balanced(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let open_line = self.line();
        let open = match self.next().map(|t| &t.kind) {
            Some(TokenKind::Punct(c @ ('{' | '(' | '['))) => *c,
            _ => return Err(SyntaxError::new(open_line, "expected an opening bracket")),
        };
        let start = self.pos;
        let mut stack = vec![open];
        while let Some(token) = self.next() {
            if let TokenKind::Punct(c) = token.kind {
                match c {
                    '{' | '(' | '[' => stack.push(c),
                    '}' | ')' | ']' => {
                        let expected = match stack.pop() {
                            Some('{') => '}',
                            Some('(') => ')',
                            _ => ']',
                        };
                        if c != expected {
                            return Err(SyntaxError::new(
                                token.line,
                                format!("unexpected '{c}', expected '{expected}'"),
                            ));
                        }
                        if stack.is_empty() {
                            return Ok(self.tokens[start..self.pos - 1].to_vec());
                        }
                    }
                    _ => {}
                }
            }
        }
        Err(SyntaxError::new(open_line, format!("unclosed '{open}'")))
    }

    /// Skip tokens up to and including the next `;` outside brackets
    fn skip_statement(&mut self) -> Result<(), SyntaxError> {
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Punct(';') => {
                    self.pos += 1;
                    return Ok(());
                }
                TokenKind::Punct('{') | TokenKind::Punct('(') | TokenKind::Punct('[') => {
                    self.skip_balanced()?;
                }
                TokenKind::Punct('}') => return Ok(()),
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    fn class(&mut self, is_abstract: bool) -> Result<PhpClass, SyntaxError> {
        let line = self.line();
        self.pos += 1;
        let (name, _) = self.expect_name("class name")?;

        let mut extends = None;
        let mut implements = Vec::new();
        let mut in_implements = false;
        loop {
            let token = self
                .peek()
                .ok_or_else(|| SyntaxError::new(self.line(), format!("class {name} has no body")))?;
            if token.is_punct('{') {
                break;
            }
            self.pos += 1;
            if token.is_name("extends") {
                extends = Some(self.expect_name("parent class")?.0);
                in_implements = false;
            } else if token.is_name("implements") {
                in_implements = true;
            } else if let (true, Some(interface)) = (in_implements, token.name()) {
                implements.push(interface.to_string());
            }
        }
        self.pos += 1;

        let mut class = PhpClass {
            name,
            is_abstract,
            extends,
            implements,
            constants: Vec::new(),
            methods: Vec::new(),
            line,
        };
        self.class_body(&mut class)?;
        Ok(class)
    }

    fn class_body(&mut self, class: &mut PhpClass) -> Result<(), SyntaxError> {
        let mut doc: Option<String> = None;
        let mut modifiers: Vec<String> = Vec::new();
        loop {
            let token = self.peek().ok_or_else(|| {
                SyntaxError::new(class.line, format!("class {} is not closed", class.name))
            })?;
            match &token.kind {
                TokenKind::Punct('}') => {
                    self.pos += 1;
                    return Ok(());
                }
                TokenKind::DocComment(text) => {
                    doc = Some(text.clone());
                    self.pos += 1;
                    continue;
                }
                TokenKind::Name(word) if MODIFIERS.iter().any(|m| word.eq_ignore_ascii_case(m)) => {
                    modifiers.push(word.to_ascii_lowercase());
                    self.pos += 1;
                    continue;
                }
                TokenKind::Name(_) if token.is_name("const") => {
                    self.pos += 1;
                    self.constants(class)?;
                }
                TokenKind::Name(_) if token.is_name("function") => {
                    self.pos += 1;
                    let method = self.method(doc.take(), &modifiers)?;
                    class.methods.push(method);
                }
                TokenKind::Name(_) if token.is_name("use") => {
                    self.pos += 1;
                    while let Some(t) = self.peek() {
                        if t.is_punct(';') {
                            self.pos += 1;
                            break;
                        }
                        if t.is_punct('{') {
                            self.skip_balanced()?;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                TokenKind::Punct(';') => {
                    self.pos += 1;
                }
                _ => self.skip_statement()?,
            }
            doc = None;
            modifiers.clear();
        }
    }

    fn constants(&mut self, class: &mut PhpClass) -> Result<(), SyntaxError> {
        loop {
            // optional type before the name: `const string NAME = ...`
            let mut names = Vec::new();
            while let Some(token) = self.peek() {
                if token.is_punct('=') {
                    break;
                }
                match &token.kind {
                    TokenKind::Name(n) => names.push((n.clone(), token.line)),
                    TokenKind::Punct('?') | TokenKind::Punct('|') => {}
                    _ => {
                        return Err(SyntaxError::new(token.line, "malformed constant declaration"))
                    }
                }
                self.pos += 1;
            }
            let (name, line) = names
                .pop()
                .ok_or_else(|| SyntaxError::new(self.line(), "constant without a name"))?;
            self.pos += 1;

            let mut value = Vec::new();
            let mut depth = 0usize;
            let terminator = loop {
                let token = self
                    .next()
                    .ok_or_else(|| SyntaxError::new(line, format!("constant {name} is not terminated")))?;
                match token.kind {
                    TokenKind::Punct('(' | '[' | '{') => depth += 1,
                    TokenKind::Punct(')' | ']' | '}') if depth > 0 => depth -= 1,
                    TokenKind::Punct(c @ (',' | ';')) if depth == 0 => break c,
                    _ => {}
                }
                value.push(token.clone());
            };
            if value.is_empty() {
                return Err(SyntaxError::new(line, format!("constant {name} has no value")));
            }
            class.constants.push(PhpConstant { name, value, line });
            if terminator == ';' {
                return Ok(());
            }
        }
    }

    fn method(&mut self, doc: Option<String>, modifiers: &[String]) -> Result<PhpMethod, SyntaxError> {
        if self.peek().is_some_and(|t| t.is_punct('&')) {
            self.pos += 1;
        }
        let (name, line) = self.expect_name("method name")?;
        let body = self.function_tail()?;
        let has = |m: &str| modifiers.iter().any(|x| x == m);
        let visibility = if has("private") {
            Visibility::Private
        } else if has("protected") {
            Visibility::Protected
        } else {
            Visibility::Public
        };
        Ok(PhpMethod {
            name,
            doc,
            visibility,
            is_static: has("static"),
            body,
            line,
        })
    }

    /// Parse from the parameter list to the end of the body (or the `;` of an
    /// abstract declaration)
    fn function_tail(&mut self) -> Result<Option<Vec<Token>>, SyntaxError> {
        while let Some(token) = self.peek() {
            if token.is_punct('(') {
                self.skip_balanced()?;
                break;
            }
            self.pos += 1;
        }
        while let Some(token) = self.peek() {
            if token.is_punct('{') {
                return self.skip_balanced().map(Some);
            }
            if token.is_punct(';') {
                self.pos += 1;
                return Ok(None);
            }
            if token.is_punct('(') {
                // closure `use (...)` clause
                self.skip_balanced()?;
                continue;
            }
            self.pos += 1;
        }
        Err(SyntaxError::new(self.line(), "function without a body"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMPAIGN: &str = r#"<?php
/**
 * Copyright header
 */

namespace FacebookAds\Object;

use FacebookAds\Object\Fields\CampaignFields;
use FacebookAds\Object\Traits\CannotDelete;

class Campaign extends AbstractArchivableCrudObject
  implements CanRedownloadInterface {

  use CannotDelete;

  const STATUS_ACTIVE = 'ACTIVE';
  const RETRY = 3, NAME = "campaign";

  protected static $fields = array('a', 'b');

  /**
   * @return string
   */
  protected function getEndpoint() {
    return 'campaigns';
  }

  /**
   * Fetch the ad sets of this campaign.
   */
  public function getAdSets(array $fields = array(), array $params = array()) {
    return $this->getManyByConnection(AdSet::className(), $fields, $params);
  }

  public static function className() {
    return get_called_class();
  }

  abstract protected function later();
}
"#;

    #[test]
    fn test_parse_class_structure() {
        let file = parse_source(CAMPAIGN).unwrap();
        assert_eq!(file.namespace.as_deref(), Some("FacebookAds\\Object"));
        assert_eq!(file.classes.len(), 1);

        let class = file.class("Campaign").unwrap();
        assert_eq!(class.extends.as_deref(), Some("AbstractArchivableCrudObject"));
        assert_eq!(class.implements, vec!["CanRedownloadInterface".to_string()]);

        let names: Vec<_> = class.constants.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["STATUS_ACTIVE", "RETRY", "NAME"]);
        assert_eq!(class.constants[1].value[0].kind, TokenKind::Number("3".into()));

        let methods: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["getEndpoint", "getAdSets", "className", "later"]);
    }

    #[test]
    fn test_method_modifiers_and_docs() {
        let file = parse_source(CAMPAIGN).unwrap();
        let class = file.class("Campaign").unwrap();

        let endpoint = class.method("GETENDPOINT").unwrap();
        assert_eq!(endpoint.visibility, Visibility::Protected);
        assert!(endpoint.doc.as_deref().unwrap().contains("@return"));

        let ad_sets = class.method("getAdSets").unwrap();
        assert_eq!(ad_sets.visibility, Visibility::Public);
        assert!(!ad_sets.is_static);
        assert!(ad_sets.doc.as_deref().unwrap().contains("Fetch the ad sets"));
        assert!(ad_sets.body.as_ref().unwrap()[0].is_name("return"));

        let class_name = class.method("className").unwrap();
        assert!(class_name.is_static);
        assert!(class_name.doc.is_none());

        assert!(class.method("later").unwrap().body.is_none());
    }

    #[test]
    fn test_skips_interfaces_traits_and_class_constants() {
        let source = r#"<?php
interface Thing { public function go(); }
trait Helper { function help() { return Foo::class; } }
function outer() { $x = new class { const IGNORED = 1; }; }
final class Real { const A = 'a'; }
"#;
        let file = parse_source(source).unwrap();
        let names: Vec<_> = file.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Real"]);
    }

    #[test]
    fn test_abstract_class_flag() {
        let file = parse_source("<?php abstract class Base { }").unwrap();
        assert!(file.classes[0].is_abstract);
    }

    #[test]
    fn test_typed_constant_and_nested_value() {
        let file = parse_source("<?php class T { const string A = ('x'), B = 'y'; }").unwrap();
        let class = &file.classes[0];
        assert_eq!(class.constants[0].name, "A");
        assert_eq!(class.constants[0].value.len(), 3);
        assert_eq!(class.constants[1].name, "B");
    }

    #[test]
    fn test_unclosed_class_is_an_error() {
        let err = parse_source("<?php\nclass Broken {\n  const A = 'a';\n").unwrap_err();
        assert!(err.message.contains("Broken"), "{err}");
    }

    #[test]
    fn test_mismatched_brackets_is_an_error() {
        let err = parse_source("<?php class Broken { function f() { return (1]; } }").unwrap_err();
        assert!(err.message.contains("unexpected"), "{err}");
    }
}
