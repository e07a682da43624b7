//! Usage: Offset-tracking syntax tree for JSONC documents.

use serde_json::{Map, Value};

use super::scanner::{Scanner, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NodeKind {
    Object,
    Array,
    Property,
    Leaf,
}

/// `Property` nodes hold `[key, value]` children; `Leaf` nodes carry their decoded value.
#[derive(Debug, Clone)]
pub(super) struct Node {
    pub kind: NodeKind,
    pub offset: usize,
    pub length: usize,
    pub children: Vec<Node>,
    pub value: Option<Value>,
}

impl Node {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn property_key(&self) -> Option<&str> {
        if self.kind != NodeKind::Property {
            return None;
        }
        self.children.first()?.value.as_ref()?.as_str()
    }

    pub fn property_value(&self) -> Option<&Node> {
        if self.kind != NodeKind::Property {
            return None;
        }
        self.children.get(1)
    }

    /// First property with a matching key wins.
    pub fn find_property(&self, key: &str) -> Option<(usize, &Node)> {
        if self.kind != NodeKind::Object {
            return None;
        }
        self.children
            .iter()
            .enumerate()
            .find(|(_, prop)| prop.property_key() == Some(key))
    }

    pub fn to_value(&self) -> Value {
        match self.kind {
            NodeKind::Object => {
                let mut out = Map::new();
                for prop in &self.children {
                    if let (Some(key), Some(value)) = (prop.property_key(), prop.property_value())
                    {
                        out.insert(key.to_string(), value.to_value());
                    }
                }
                Value::Object(out)
            }
            NodeKind::Array => Value::Array(self.children.iter().map(Node::to_value).collect()),
            NodeKind::Property => self.property_value().map(Node::to_value).unwrap_or(Value::Null),
            NodeKind::Leaf => self.value.clone().unwrap_or(Value::Null),
        }
    }
}

pub(super) fn find_node_at_location<'a>(root: &'a Node, path: &[&str]) -> Option<&'a Node> {
    let mut node = root;
    for segment in path {
        let (_, prop) = node.find_property(segment)?;
        node = prop.property_value()?;
    }
    Some(node)
}

/// `Ok(None)` for documents with no value (blank or comments only).
pub(super) fn parse_tree(text: &str) -> Result<Option<Node>, String> {
    let mut parser = Parser::new(text)?;
    if parser.current.kind == TokenKind::Eof {
        return Ok(None);
    }
    let root = parser.parse_value()?;
    if parser.current.kind != TokenKind::Eof {
        return Err(format!(
            "unexpected trailing content at offset {}",
            parser.current.offset
        ));
    }
    Ok(Some(root))
}

struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Result<Self, String> {
        let mut scanner = Scanner::new(text);
        let current = scanner.next_token()?;
        Ok(Self { scanner, current })
    }

    fn advance(&mut self) -> Result<Token, String> {
        let prev = self.current;
        self.current = self.scanner.next_token()?;
        Ok(prev)
    }

    fn parse_value(&mut self) -> Result<Node, String> {
        match self.current.kind {
            TokenKind::OpenBrace => self.parse_object(),
            TokenKind::OpenBracket => self.parse_array(),
            TokenKind::String => {
                let token = self.advance()?;
                let decoded = serde_json::from_str::<String>(self.scanner.slice(&token))
                    .map_err(|e| format!("invalid string at offset {}: {e}", token.offset))?;
                Ok(leaf(&token, Value::String(decoded)))
            }
            TokenKind::Number => {
                let token = self.advance()?;
                let number = serde_json::from_str::<serde_json::Number>(self.scanner.slice(&token))
                    .map_err(|e| format!("invalid number at offset {}: {e}", token.offset))?;
                Ok(leaf(&token, Value::Number(number)))
            }
            TokenKind::True => Ok(leaf(&self.advance()?, Value::Bool(true))),
            TokenKind::False => Ok(leaf(&self.advance()?, Value::Bool(false))),
            TokenKind::Null => Ok(leaf(&self.advance()?, Value::Null)),
            _ => Err(format!("value expected at offset {}", self.current.offset)),
        }
    }

    fn parse_object(&mut self) -> Result<Node, String> {
        let open = self.advance()?;
        let mut children = Vec::new();

        loop {
            match self.current.kind {
                TokenKind::CloseBrace => break,
                TokenKind::String => {}
                _ => {
                    return Err(format!(
                        "property name expected at offset {}",
                        self.current.offset
                    ))
                }
            }

            let key = self.parse_value()?;
            if self.current.kind != TokenKind::Colon {
                return Err(format!("colon expected at offset {}", self.current.offset));
            }
            self.advance()?;
            let value = self.parse_value()?;

            children.push(Node {
                kind: NodeKind::Property,
                offset: key.offset,
                length: value.end() - key.offset,
                children: vec![key, value],
                value: None,
            });

            match self.current.kind {
                // trailing comma is tolerated: the next iteration sees `}`
                TokenKind::Comma => {
                    self.advance()?;
                }
                TokenKind::CloseBrace => {}
                _ => return Err(format!("comma expected at offset {}", self.current.offset)),
            }
        }

        let close = self.advance()?;
        Ok(Node {
            kind: NodeKind::Object,
            offset: open.offset,
            length: close.end() - open.offset,
            children,
            value: None,
        })
    }

    fn parse_array(&mut self) -> Result<Node, String> {
        let open = self.advance()?;
        let mut children = Vec::new();

        while self.current.kind != TokenKind::CloseBracket {
            children.push(self.parse_value()?);
            match self.current.kind {
                TokenKind::Comma => {
                    self.advance()?;
                }
                TokenKind::CloseBracket => {}
                _ => return Err(format!("comma expected at offset {}", self.current.offset)),
            }
        }

        let close = self.advance()?;
        Ok(Node {
            kind: NodeKind::Array,
            offset: open.offset,
            length: close.end() - open.offset,
            children,
            value: None,
        })
    }
}

fn leaf(token: &Token, value: Value) -> Node {
    Node {
        kind: NodeKind::Leaf,
        offset: token.offset,
        length: token.length,
        children: Vec::new(),
        value: Some(value),
    }
}
