//! Validation of query documents against a [`Schema`]
//!
//! [`validate`] runs every rule and collects all errors it finds,
//! except that a document nested deeper than the configured maximum
//! is reported with [`Rule::MaxDepthExceeded`] errors only.
//!
//! ```rust
//! use gqlrt::ast::QueryDocument;
//! use gqlrt::validation::{validate, Rule};
//! use gqlrt::Schema;
//!
//! let schema = Schema::parse("type Query { hero: String }").unwrap();
//! let document = QueryDocument::parse("{ hero villain }").unwrap();
//! let errors = validate(&schema, &document, 0);
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].rule, Rule::FieldsOnCorrectType);
//! assert_eq!(errors[0].message, r#"Cannot query field "villain" on type "Query"."#);
//! ```

use crate::ast;
use crate::ast::QueryDocument;
use crate::response::GraphQLError;
use crate::response::LineColumn;
use crate::Location;
use crate::Name;
use crate::Node;
use crate::Schema;
use std::collections::HashMap;
use std::fmt;

mod depth;
mod directive;
mod field;
mod fragment;
mod operation;
mod overlap;
mod value;
mod variable;

/// The validation rule that rejected a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    LoneAnonymousOperation,
    UniqueOperationNames,
    UniqueVariableNames,
    UniqueFragmentNames,
    UniqueArgumentNames,
    UniqueInputFieldNames,
    UniqueDirectivesPerLocation,
    VariablesAreInputTypes,
    DefaultValuesOfCorrectType,
    FragmentsOnCompositeTypes,
    FieldsOnCorrectType,
    ScalarLeafs,
    ArgumentsOfCorrectType,
    ProvidedNonNullArguments,
    KnownArgumentNames,
    KnownDirectives,
    KnownFragmentNames,
    KnownTypeNames,
    KnownOperationTypes,
    NoUndefinedVariables,
    NoUnusedVariables,
    NoUnusedFragments,
    NoFragmentCycles,
    PossibleFragmentSpreads,
    OverlappingFieldsCanBeMerged,
    VariablesInAllowedPosition,
    SingleFieldSubscriptions,
    MaxDepthExceeded,
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoneAnonymousOperation => "LoneAnonymousOperation",
            Self::UniqueOperationNames => "UniqueOperationNames",
            Self::UniqueVariableNames => "UniqueVariableNames",
            Self::UniqueFragmentNames => "UniqueFragmentNames",
            Self::UniqueArgumentNames => "UniqueArgumentNames",
            Self::UniqueInputFieldNames => "UniqueInputFieldNames",
            Self::UniqueDirectivesPerLocation => "UniqueDirectivesPerLocation",
            Self::VariablesAreInputTypes => "VariablesAreInputTypes",
            Self::DefaultValuesOfCorrectType => "DefaultValuesOfCorrectType",
            Self::FragmentsOnCompositeTypes => "FragmentsOnCompositeTypes",
            Self::FieldsOnCorrectType => "FieldsOnCorrectType",
            Self::ScalarLeafs => "ScalarLeafs",
            Self::ArgumentsOfCorrectType => "ArgumentsOfCorrectType",
            Self::ProvidedNonNullArguments => "ProvidedNonNullArguments",
            Self::KnownArgumentNames => "KnownArgumentNames",
            Self::KnownDirectives => "KnownDirectives",
            Self::KnownFragmentNames => "KnownFragmentNames",
            Self::KnownTypeNames => "KnownTypeNames",
            Self::KnownOperationTypes => "KnownOperationTypes",
            Self::NoUndefinedVariables => "NoUndefinedVariables",
            Self::NoUnusedVariables => "NoUnusedVariables",
            Self::NoUnusedFragments => "NoUnusedFragments",
            Self::NoFragmentCycles => "NoFragmentCycles",
            Self::PossibleFragmentSpreads => "PossibleFragmentSpreads",
            Self::OverlappingFieldsCanBeMerged => "OverlappingFieldsCanBeMerged",
            Self::VariablesInAllowedPosition => "VariablesInAllowedPosition",
            Self::SingleFieldSubscriptions => "SingleFieldSubscriptions",
            Self::MaxDepthExceeded => "MaxDepthExceeded",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document failed a validation rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub locations: Vec<Location>,
    pub rule: Rule,
}

impl ValidationError {
    pub fn to_graphql_error(&self) -> GraphQLError {
        let mut error = GraphQLError::new(self.message.clone(), None).with_rule(self.rule.as_str());
        error.locations = self.locations.iter().copied().map(LineColumn::from).collect();
        error
    }
}

/// Validates `document` against `schema`.
///
/// When `max_depth` is non-zero, fields nested deeper than that are reported
/// and no other rule runs. Errors are returned in document order.
pub fn validate(schema: &Schema, document: &QueryDocument, max_depth: usize) -> Vec<ValidationError> {
    let mut ctx = ValidationContext::new(schema, document);
    if max_depth > 0 {
        depth::validate_max_depth(&mut ctx, max_depth);
        if !ctx.errors.is_empty() {
            return ctx.finish();
        }
    }
    operation::validate_operations(&mut ctx);
    fragment::validate_fragment_definitions(&mut ctx);
    for operation in &document.operations {
        variable::validate_variables(&mut ctx, operation);
    }
    ctx.finish()
}

pub(crate) struct ValidationContext<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) document: &'a QueryDocument,
    /// First definition of each fragment name
    pub(crate) fragments: HashMap<&'a str, &'a Node<ast::FragmentDefinition>>,
    pub(crate) errors: Vec<ValidationError>,
    pub(crate) overlap_cache: overlap::PairCache,
}

impl<'a> ValidationContext<'a> {
    fn new(schema: &'a Schema, document: &'a QueryDocument) -> Self {
        let mut fragments = HashMap::new();
        for fragment in &document.fragments {
            fragments.entry(fragment.name.as_str()).or_insert(fragment);
        }
        Self {
            schema,
            document,
            fragments,
            errors: Vec::new(),
            overlap_cache: Default::default(),
        }
    }

    pub(crate) fn report(
        &mut self,
        rule: Rule,
        message: impl Into<String>,
        locations: impl IntoIterator<Item = Option<Location>>,
    ) {
        self.errors.push(ValidationError {
            message: message.into(),
            locations: locations.into_iter().flatten().collect(),
            rule,
        })
    }

    pub(crate) fn fragment(&self, name: &Name) -> Option<&'a Node<ast::FragmentDefinition>> {
        self.fragments.get(name.as_str()).copied()
    }

    fn finish(mut self) -> Vec<ValidationError> {
        // Stable: errors at the same place keep the order rules found them in
        self.errors
            .sort_by_key(|error| error.locations.first().copied().unwrap_or_default());
        self.errors
    }
}

/// Returns the locations and names of every fragment spread in `selections`,
/// including nested ones.
pub(crate) fn fragment_spreads<'a>(
    selections: &'a [ast::Selection],
    spreads: &mut Vec<&'a Node<ast::FragmentSpread>>,
) {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => fragment_spreads(&field.selection_set, spreads),
            ast::Selection::FragmentSpread(spread) => spreads.push(spread),
            ast::Selection::InlineFragment(inline) => {
                fragment_spreads(&inline.selection_set, spreads)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;

    pub(crate) const STARWARS: &str = r#"
        schema { query: Query mutation: Mutation subscription: Subscription }
        type Query {
            hero(episode: Episode): Character
            human(id: ID!): Human
            droid(id: ID!): Droid
            search(text: String): [SearchResult]
            reviews(episode: Episode!, first: Int): [Review]
        }
        type Mutation { createReview(episode: Episode!, review: ReviewInput!): Review }
        type Subscription { reviewAdded(episode: Episode): Review }
        enum Episode { NEWHOPE EMPIRE JEDI }
        interface Character {
            id: ID!
            name: String!
            friends: [Character]
            appearsIn: [Episode!]!
        }
        type Human implements Character {
            id: ID!
            name: String!
            height(unit: LengthUnit = METER, scale: Float): Float
            homePlanet: String
            friends: [Character]
            appearsIn: [Episode!]!
        }
        type Droid implements Character {
            id: ID!
            name: String!
            friends: [Character]
            appearsIn: [Episode!]!
            primaryFunction: String
        }
        enum LengthUnit { METER FOOT }
        type Review { episode: Episode stars: Int! commentary: String }
        input ReviewInput { stars: Int! commentary: String }
        union SearchResult = Human | Droid
        scalar Time
    "#;

    /// Validates `query` against the Star Wars schema and returns `(rule, message)` pairs.
    pub(crate) fn errors(query: &str) -> Vec<(Rule, String)> {
        errors_with_depth(query, 0)
    }

    pub(crate) fn errors_with_depth(query: &str, max_depth: usize) -> Vec<(Rule, String)> {
        let schema = Schema::parse(STARWARS).unwrap();
        let document = QueryDocument::parse(query).unwrap();
        validate(&schema, &document, max_depth)
            .into_iter()
            .map(|error| (error.rule, error.message))
            .collect()
    }

    pub(crate) fn rules(query: &str) -> Vec<Rule> {
        errors(query).into_iter().map(|(rule, _)| rule).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;

    #[test]
    fn valid_document() {
        assert_eq!(
            errors(
                r#"
                query Hero($episode: Episode = JEDI, $withFriends: Boolean!) {
                    hero(episode: $episode) {
                        __typename
                        name
                        ...HumanDetails
                        ... on Droid { primaryFunction }
                        friends @include(if: $withFriends) { name }
                    }
                }
                fragment HumanDetails on Human { height(unit: FOOT) }
                "#
            ),
            []
        );
    }

    #[test]
    fn errors_come_in_document_order() {
        let schema = Schema::parse(STARWARS).unwrap();
        let document = QueryDocument::parse(
            "{ hero { unknownA } } fragment F on Nope { x } query Q { unknownB }",
        )
        .unwrap();
        let errors = validate(&schema, &document, 0);
        let rules: Vec<_> = errors.iter().map(|error| error.rule.as_str()).collect();
        assert_eq!(
            rules,
            [
                "LoneAnonymousOperation",
                "FieldsOnCorrectType",
                "KnownTypeNames",
                "NoUnusedFragments",
                "FieldsOnCorrectType",
            ]
        );
        assert_eq!(errors[1].locations, [Location::new(1, 10)]);
    }

    #[test]
    fn graphql_error_carries_rule() {
        let schema = Schema::parse(STARWARS).unwrap();
        let document = QueryDocument::parse("{ hero { unknownField } }").unwrap();
        let errors = validate(&schema, &document, 0);
        let error = errors[0].to_graphql_error();
        assert_eq!(error.rule.as_deref(), Some("FieldsOnCorrectType"));
        assert_eq!(error.locations, [LineColumn { line: 1, column: 10 }]);
        assert_eq!(
            error.message,
            r#"Cannot query field "unknownField" on type "Character"."#
        );
    }
}
