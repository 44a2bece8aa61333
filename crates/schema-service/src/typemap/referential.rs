//! Referential action text codec.

use crate::core::schema::ReferentialAction;

/// SQL text for a referential action.
pub fn action_to_sql(action: ReferentialAction) -> &'static str {
    match action {
        ReferentialAction::Cascade => "CASCADE",
        ReferentialAction::SetNull => "SET NULL",
        ReferentialAction::Restrict => "RESTRICT",
        ReferentialAction::NoAction => "NO ACTION",
    }
}

/// Parse SQL referential action text as reported by the engine.
///
/// Matching is exact. Anything unrecognized, including the empty string,
/// is `NO ACTION`.
pub fn action_from_sql(text: &str) -> ReferentialAction {
    match text {
        "CASCADE" => ReferentialAction::Cascade,
        "SET NULL" => ReferentialAction::SetNull,
        "RESTRICT" => ReferentialAction::Restrict,
        _ => ReferentialAction::NoAction,
    }
}
