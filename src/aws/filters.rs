use std::fmt;

use aws_sdk_ec2::types;
use winnow::Result;
use winnow::combinator::eof;
use winnow::prelude::*;
use winnow::token::take_while;

use crate::errors::RoostError;

const DELIMITER: char = '=';

/// One tag constraint. `name=value` matches the tag exactly, a bare string
/// matches any instance carrying a tag with that name.
#[derive(Debug, Clone, PartialEq)]
pub enum TagFilter {
    KeyValue { name: String, value: String },
    KeyExists { name: String },
}

fn parse_key_value(input: &mut &str) -> Result<(String, String)> {
    let name = take_while(1.., |c| c != DELIMITER).parse_next(input)?;
    DELIMITER.parse_next(input)?;
    let value = take_while(1.., |c| c != DELIMITER).parse_next(input)?;
    eof.parse_next(input)?;

    Ok((name.to_string(), value.to_string()))
}

impl TagFilter {
    pub fn parse(raw: &str) -> Result<Self, RoostError> {
        if raw.is_empty() {
            return Err(RoostError::MalformedFilter(raw.to_string()));
        }
        if !raw.contains(DELIMITER) {
            return Ok(TagFilter::KeyExists {
                name: raw.to_string(),
            });
        }

        let mut input = raw;
        match parse_key_value(&mut input) {
            Ok((name, value)) => Ok(TagFilter::KeyValue { name, value }),
            Err(_) => Err(RoostError::MalformedFilter(raw.to_string())),
        }
    }

    pub fn to_ec2_filter(&self) -> types::Filter {
        match self {
            TagFilter::KeyValue { name, value } => types::Filter::builder()
                .name(format!("tag:{name}"))
                .values(value.clone())
                .build(),
            TagFilter::KeyExists { name } => types::Filter::builder()
                .name("tag-key")
                .values(name.clone())
                .build(),
        }
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagFilter::KeyValue { name, value } => write!(f, "{name}{DELIMITER}{value}"),
            TagFilter::KeyExists { name } => write!(f, "{name}"),
        }
    }
}
