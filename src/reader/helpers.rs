//! Parsing conveniences on top of [`XmlRead`]
//!
//! Small building blocks for hand-written document parsers: structural
//! expectations (`require*`), skipping, and required/typed attributes.
//! Failures are [`XmlError::Structure`] errors carrying the reader position.

use std::str::FromStr;

use crate::core::scanner::is_whitespace;
use crate::error::{Result, XmlError};
use crate::reader::events::EventType;
use crate::reader::XmlRead;

/// Render `{namespace}local`, or just `local` without a namespace
pub fn qualified_name(namespace_uri: Option<&str>, local_name: &str) -> String {
    match namespace_uri {
        Some(ns) => format!("{{{ns}}}{local_name}"),
        None => local_name.to_string(),
    }
}

/// Extension methods available on every reader
pub trait XmlReadExt: XmlRead {
    /// Qualified name of the current element event, if it is one
    fn current_name(&self) -> Option<String> {
        if !self.event_type().is_element() {
            return None;
        }
        let local_name = self.local_name().ok()?;
        Some(qualified_name(self.namespace_uri().ok()?, local_name))
    }

    /// Check if the current element event has this namespace and local name
    fn matches(&self, namespace_uri: Option<&str>, local_name: &str) -> bool {
        self.event_type().is_element()
            && self.namespace_uri().ok() == Some(namespace_uri)
            && self.local_name().ok() == Some(local_name)
    }

    /// Fail unless the current event is `event`
    fn require(&self, event: EventType) -> Result<()> {
        if self.event_type() == event {
            return Ok(());
        }
        Err(self.unexpected(event.to_string()))
    }

    /// Fail unless the current event is `event` on the named element
    fn require_element(&self, event: EventType, namespace_uri: Option<&str>, local_name: &str) -> Result<()> {
        if self.event_type() == event && self.matches(namespace_uri, local_name) {
            return Ok(());
        }
        Err(self.unexpected(format!("{event} {}", qualified_name(namespace_uri, local_name))))
    }

    /// From `START_ELEMENT`, advance to its matching `END_ELEMENT`
    fn skip_element(&mut self) -> Result<()> {
        self.require(EventType::StartElement)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next()? {
                EventType::StartElement => depth += 1,
                EventType::EndElement => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// Advance past whitespace-only `CHARACTERS` events
    fn skip_whitespace(&mut self) -> Result<()> {
        while self.event_type() == EventType::Characters {
            if !self.text()?.bytes().all(is_whitespace) {
                break;
            }
            self.next()?;
        }
        Ok(())
    }

    /// Value of an attribute that must be present
    fn parse_attribute(&self, namespace_uri: Option<&str>, local_name: &str) -> Result<&str> {
        match self.attribute_value_by_name(namespace_uri, local_name)? {
            Some(value) => Ok(value),
            None => Err(XmlError::structure(
                format!(
                    "Missing required attribute '{local_name}' of element {}.",
                    self.current_name().unwrap_or_default()
                ),
                self.position(),
            )),
        }
    }

    /// Parse a required attribute into any `FromStr` type
    fn parse_attribute_as<T: FromStr>(&self, namespace_uri: Option<&str>, local_name: &str) -> Result<T> {
        let value = self.parse_attribute(namespace_uri, local_name)?;
        value.parse().map_err(|_| {
            XmlError::structure(
                format!("Invalid value for attribute '{local_name}': {value}"),
                self.position(),
            )
        })
    }

    fn parse_i32_attribute(&self, namespace_uri: Option<&str>, local_name: &str) -> Result<i32> {
        self.parse_attribute_as(namespace_uri, local_name)
    }

    fn parse_f64_attribute(&self, namespace_uri: Option<&str>, local_name: &str) -> Result<f64> {
        self.parse_attribute_as(namespace_uri, local_name)
    }

    #[doc(hidden)]
    fn unexpected(&self, expected: String) -> XmlError {
        let found = match self.current_name() {
            Some(name) => format!("{} {name}", self.event_type()),
            None => self.event_type().to_string(),
        };
        XmlError::structure(format!("Expected {expected}, but was {found}"), self.position())
    }
}

impl<T: XmlRead + ?Sized> XmlReadExt for T {}
