use graphql_parser::{query, schema};

pub type QueryDocument = query::Document<'static, String>;
pub type SchemaDocument = schema::Document<'static, String>;

#[inline]
pub fn safe_parse_schema(sdl: &str) -> Result<SchemaDocument, schema::ParseError> {
    graphql_parser::parse_schema::<String>(sdl).map(|doc| doc.into_static())
}

#[inline]
pub fn safe_parse_document(source: &str) -> Result<QueryDocument, query::ParseError> {
    graphql_parser::parse_query::<String>(source).map(|doc| doc.into_static())
}

/// Test and tooling helper, panics on invalid input.
#[inline]
pub fn parse_schema(sdl: &str) -> SchemaDocument {
    safe_parse_schema(sdl).expect("failed to parse schema")
}

/// Test and tooling helper, panics on invalid input.
#[inline]
pub fn parse_document(source: &str) -> QueryDocument {
    safe_parse_document(source).expect("failed to parse document")
}
