//! `${name}` placeholder substitution over SPIR-V assembly text.

mod shaders;

pub use shaders::*;

use std::collections::BTreeMap;
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template `{template}` has no value for `${{{key}}}`")]
    MissingSubstitution { template: &'static str, key: String },
    #[error("template `{template}` has an unterminated placeholder at byte {offset}")]
    Unterminated {
        template: &'static str,
        offset: usize,
    },
}

/// Values for placeholders, keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitutions(BTreeMap<&'static str, String>);

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl Display) -> &mut Self {
        self.0.insert(key, value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

enum Piece<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

/// A named piece of program text.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub text: &'static str,
}

impl Template {
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self { name, text }
    }

    fn pieces(&self) -> Result<Vec<Piece<'static>>, TemplateError> {
        let mut pieces = Vec::new();
        let mut rest = self.text;
        let mut consumed = 0;
        while let Some(start) = rest.find("${") {
            pieces.push(Piece::Text(&rest[..start]));
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or(TemplateError::Unterminated {
                template: self.name,
                offset: consumed + start,
            })?;
            pieces.push(Piece::Placeholder(&after[..end]));
            consumed += start + 2 + end + 1;
            rest = &after[end + 1..];
        }
        pieces.push(Piece::Text(rest));
        Ok(pieces)
    }

    /// Every placeholder name, once each, in order of first use.
    pub fn placeholders(&self) -> Result<Vec<&'static str>, TemplateError> {
        let mut keys = Vec::new();
        for piece in self.pieces()? {
            if let Piece::Placeholder(key) = piece
                && !keys.contains(&key)
            {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Fails on the first placeholder `subs` has no value for.
    pub fn check(&self, subs: &Substitutions) -> Result<(), TemplateError> {
        match self
            .placeholders()?
            .into_iter()
            .find(|key| subs.get(key).is_none())
        {
            Some(key) => Err(TemplateError::MissingSubstitution {
                template: self.name,
                key: key.to_owned(),
            }),
            None => Ok(()),
        }
    }

    pub fn render(&self, subs: &Substitutions) -> Result<String, TemplateError> {
        self.check(subs)?;
        let mut out = String::with_capacity(self.text.len());
        for piece in self.pieces()? {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Placeholder(key) => {
                    // Present, `check` passed.
                    out.push_str(subs.get(key).unwrap_or_default());
                }
            }
        }
        Ok(out)
    }
}
