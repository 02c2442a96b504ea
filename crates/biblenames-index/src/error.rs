use biblenames_types::{BookCode, CodeError, DivisionTag, ResolutionTarget};
use thiserror::Error;

/// Fatal to the single locale or book order being loaded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error(transparent)]
    InvalidBookCode(CodeError),
    /// `scope` is `"catalog"` or `"locale <id>"`.
    #[error("{scope}: book {code} is listed more than once")]
    DuplicateBookCode { scope: String, code: BookCode },
    #[error("locale {locale}: {record} refers to book {code}, which is not in the catalog")]
    UnknownBookCodeReference {
        locale: String,
        record: String,
        code: BookCode,
    },
    #[error(
        "locale {locale}: token {key:?} is claimed by {first} (from {first_token:?}) and {second} (from {second_token:?})"
    )]
    TokenCollision {
        locale: String,
        key: String,
        first: ResolutionTarget,
        first_token: String,
        second: ResolutionTarget,
        second_token: String,
    },
    #[error("locale {locale}: leader {leader:?} is listed more than once")]
    DuplicateLeader { locale: String, leader: String },
    #[error(
        "locale {locale}: leader variant {variant:?} is claimed by leaders {first:?} and {second:?}"
    )]
    LeaderOverlap {
        locale: String,
        variant: String,
        first: String,
        second: String,
    },
    #[error("locale {locale}: division {tag} is defined more than once")]
    DuplicateDivisionTag { locale: String, tag: DivisionTag },
    #[error("locale {locale}: division {tag} lists book {code} more than once")]
    DuplicateDivisionMember {
        locale: String,
        tag: DivisionTag,
        code: BookCode,
    },
    #[error("locale {locale}: division {tag} includes no books")]
    EmptyDivision { locale: String, tag: DivisionTag },
    #[error("book order {order:?} has no entries")]
    EmptyBookOrder { order: String },
    #[error("book order {order:?}: entry {code} has position {found}, expected {expected}")]
    PositionMismatch {
        order: String,
        code: BookCode,
        expected: u32,
        found: u32,
    },
}

impl From<CodeError> for LoadError {
    fn from(err: CodeError) -> Self {
        match err {
            CodeError::Duplicate(code) => LoadError::DuplicateBookCode {
                scope: "catalog".to_string(),
                code,
            },
            other => LoadError::InvalidBookCode(other),
        }
    }
}

/// Returned to callers of `resolve`; never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("reference text is empty")]
    EmptyInput,
    #[error("locale {0:?} is not loaded")]
    UnknownLocale(String),
    #[error("no book or division in locale {locale} matches {input:?}")]
    NotFound { locale: String, input: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("book order {0:?} is not loaded")]
    UnknownOrderName(String),
    #[error("book {code} is not part of book order {order:?}")]
    CodeNotInOrder { order: String, code: BookCode },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DivisionError {
    #[error("locale {0:?} is not loaded")]
    UnknownLocale(String),
    #[error("locale {locale} has no division {tag:?}")]
    UnknownDivision { locale: String, tag: String },
}
