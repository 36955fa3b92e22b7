use crate::ast::QueryDocument;
use crate::ast::SchemaDocument;
use crate::parser::grammar::fragment;
use crate::parser::grammar::operation;
use crate::parser::grammar::schema;
use crate::parser::ParseContext;
use crate::SyntaxError;
use crate::TokenKind;

/// See: https://spec.graphql.org/October2021/#ExecutableDocument
///
/// *ExecutableDocument*:
///     ExecutableDefinition+
///
/// *ExecutableDefinition*:
///     OperationDefinition
///     FragmentDefinition
pub(crate) fn query_document(p: &mut ParseContext) -> Result<QueryDocument, SyntaxError> {
    let mut document = QueryDocument::default();
    loop {
        let token = p.peek()?;
        match (token.kind(), token.data()) {
            (TokenKind::Eof, _) => break,
            (TokenKind::LCurly, _)
            | (TokenKind::Name, "query" | "mutation" | "subscription") => {
                document
                    .operations
                    .push(operation::operation_definition(p)?);
            }
            (TokenKind::Name, "fragment") => {
                document.fragments.push(fragment::fragment_definition(p)?);
            }
            _ => return Err(p.unexpected(r#"operation type, "fragment" or "{""#)),
        }
    }
    if document.operations.is_empty() && document.fragments.is_empty() {
        return Err(p.unexpected("a definition"));
    }
    Ok(document)
}

/// See: https://spec.graphql.org/October2021/#TypeSystemDocument
///
/// *TypeSystemDocument*:
///     TypeSystemDefinition+
///
/// An empty document is accepted, so that builders may add sources that
/// only contain comments.
pub(crate) fn schema_document(p: &mut ParseContext) -> Result<SchemaDocument, SyntaxError> {
    let mut document = SchemaDocument::default();
    while !p.at(TokenKind::Eof)? {
        document.definitions.push(schema::definition(p)?);
    }
    Ok(document)
}
