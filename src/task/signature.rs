//! Declared call signatures.
//!
//! A task declares its parameters up front instead of having them
//! introspected at bind time. Keyword edges are checked against this
//! declaration with a plain containment test.

use serde::{Deserialize, Serialize};

/// How a declared parameter can receive its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Only by position.
    PositionalOnly,
    /// By position or by keyword.
    #[default]
    PositionalOrKeyword,
    /// Collects extra positional arguments (`*args`).
    VarPositional,
    /// Only by keyword.
    KeywordOnly,
    /// Collects extra keyword arguments (`**kwargs`).
    VarKeyword,
}

impl ParamKind {
    /// Whether a parameter of this kind can be bound by name.
    pub fn accepts_keyword(self) -> bool {
        matches!(self, ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly)
    }
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,

    /// Parameter kind.
    #[serde(default)]
    pub kind: ParamKind,
}

impl Param {
    /// Create a parameter of the given kind.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Why a keyword could not be bound against a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindError {
    /// The offending keyword.
    pub key: String,
    /// Human-readable reason.
    pub reason: String,
}

/// The ordered parameter list of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    /// Create an empty signature (a task that takes no arguments).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a signature of positional-or-keyword parameters.
    pub fn keywords<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: names
                .into_iter()
                .map(|n| Param::new(n, ParamKind::PositionalOrKeyword))
                .collect(),
        }
    }

    /// Append a parameter.
    pub fn with(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(Param::new(name, kind));
        self
    }

    /// Append an already-built parameter.
    pub fn push(&mut self, param: Param) {
        self.params.push(param);
    }

    /// All declared parameters, in declaration order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Get a parameter by name.
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// The variable-positional parameter, if one is declared.
    pub fn var_positional(&self) -> Option<&Param> {
        self.params
            .iter()
            .find(|p| p.kind == ParamKind::VarPositional)
    }

    /// Whether unknown keywords are collected by a `**kwargs` parameter.
    pub fn accepts_var_keyword(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::VarKeyword)
    }

    /// Check that every keyword can be bound by name.
    ///
    /// This is a partial bind: parameters that are not mentioned are left
    /// unbound and do not cause an error.
    pub fn bind_keywords<'a, I>(&self, keys: I) -> Result<(), BindError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let var_keyword = self.accepts_var_keyword();

        for key in keys {
            let bound = match self.get(key) {
                Some(param) if param.kind.accepts_keyword() => true,
                Some(param) if param.kind == ParamKind::PositionalOnly && !var_keyword => {
                    return Err(BindError {
                        key: key.to_string(),
                        reason: "parameter is positional-only".to_string(),
                    });
                }
                _ => var_keyword,
            };

            if !bound {
                return Err(BindError {
                    key: key.to_string(),
                    reason: "got an unexpected keyword argument".to_string(),
                });
            }
        }

        Ok(())
    }
}
