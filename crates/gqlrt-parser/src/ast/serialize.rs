use super::*;
use std::fmt;
use std::fmt::Display;

const INDENT: &str = "  ";

/// Writes GraphQL syntax to a formatter.
///
/// Blocks put one item per line. Argument lists, variable definitions
/// and values are always printed on a single line.
struct Printer<'a, 'f> {
    f: &'a mut fmt::Formatter<'f>,
    depth: usize,
    inline: bool,
    /// Nothing written yet
    fresh: bool,
}

trait Print {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result;
}

impl<T: Print + ?Sized> Print for &T {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        (**self).print(p)
    }
}

impl<T: Print> Print for Node<T> {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        (**self).print(p)
    }
}

impl<'a, 'f> Printer<'a, 'f> {
    fn new(f: &'a mut fmt::Formatter<'f>) -> Self {
        Self {
            f,
            depth: 0,
            inline: false,
            fresh: true,
        }
    }

    fn str(&mut self, text: &str) -> fmt::Result {
        self.fresh = false;
        self.f.write_str(text)
    }

    fn args(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        self.fresh = false;
        self.f.write_fmt(args)
    }

    /// A new line at the current depth, or a single space inline
    fn break_line(&mut self) -> fmt::Result {
        if self.inline {
            return self.str(" ");
        }
        self.str("\n")?;
        for _ in 0..self.depth {
            self.str(INDENT)?;
        }
        Ok(())
    }

    fn indent(&mut self) -> fmt::Result {
        self.depth += 1;
        self.break_line()
    }

    fn dedent(&mut self) -> fmt::Result {
        self.depth -= 1;
        self.break_line()
    }

    /// `open` then the items separated by `separator`, then `close`
    fn joined<T>(
        &mut self,
        open: &str,
        separator: &str,
        close: &str,
        items: &[T],
        mut each: impl FnMut(&mut Self, &T) -> fmt::Result,
    ) -> fmt::Result {
        self.str(open)?;
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.str(separator)?;
            }
            each(self, item)?;
        }
        self.str(close)
    }

    /// `(a, b)`, `[a, b]` or `{a: b}`, on one line whatever the layout
    fn list<T>(
        &mut self,
        open: &str,
        close: &str,
        items: &[T],
        each: impl FnMut(&mut Self, &T) -> fmt::Result,
    ) -> fmt::Result {
        let inline = std::mem::replace(&mut self.inline, true);
        let result = self.joined(open, ", ", close, items, each);
        self.inline = inline;
        result
    }

    /// `{` and one item per line at the next depth, then `}`
    fn block<T: Print>(&mut self, items: &[T]) -> fmt::Result {
        self.str("{")?;
        if let Some((first, rest)) = items.split_first() {
            self.indent()?;
            first.print(self)?;
            for item in rest {
                self.break_line()?;
                item.print(self)?;
            }
            self.dedent()?;
        }
        self.str("}")
    }

    /// Definitions each end with a new line, with an empty line between two
    fn definitions<T: Print>(&mut self, items: impl IntoIterator<Item = T>) -> fmt::Result {
        for (index, item) in items.into_iter().enumerate() {
            if index > 0 {
                self.str("\n")?;
            }
            item.print(self)?;
            self.str("\n")?;
        }
        Ok(())
    }

    /// Body of a type with fields, from its name on
    fn fields_type(
        &mut self,
        name: &str,
        implements_interfaces: &[Name],
        directives: &DirectiveList,
        fields: &[Node<FieldDefinition>],
    ) -> fmt::Result {
        self.str(name)?;
        if !implements_interfaces.is_empty() {
            self.joined(" implements ", " & ", "", implements_interfaces, |p, name| {
                p.str(name)
            })?;
        }
        directives.print(self)?;
        if !fields.is_empty() {
            self.str(" ")?;
            self.block(fields)?;
        }
        Ok(())
    }

    fn arguments(&mut self, arguments: &[Node<Argument>]) -> fmt::Result {
        if arguments.is_empty() {
            return Ok(());
        }
        self.list("(", ")", arguments, |p, argument| argument.print(p))
    }

    /// Described arguments go one per line so their descriptions stay readable.
    fn arguments_definition(&mut self, arguments: &[Node<InputValueDefinition>]) -> fmt::Result {
        if arguments.is_empty() {
            return Ok(());
        }
        if !arguments.iter().any(|arg| arg.description.is_some()) {
            return self.list("(", ")", arguments, |p, arg| arg.print(p));
        }
        self.str("(")?;
        self.depth += 1;
        for arg in arguments {
            self.break_line()?;
            arg.print(self)?;
        }
        self.dedent()?;
        self.str(")")
    }

    fn string(&mut self, mut text: &str) -> fmt::Result {
        self.str("\"")?;
        while let Some(i) = text.find(|c| (c < ' ' && c != '\t') || c == '"' || c == '\\') {
            let (plain, rest) = text.split_at(i);
            self.str(plain)?;
            // Every character escaped here is ASCII, one byte long
            match rest.as_bytes()[0] {
                b'\x08' => self.str("\\b")?,
                b'\n' => self.str("\\n")?,
                b'\x0C' => self.str("\\f")?,
                b'\r' => self.str("\\r")?,
                b'"' => self.str("\\\"")?,
                b'\\' => self.str("\\\\")?,
                byte => self.args(format_args!("\\u{byte:04X}"))?,
            }
            text = &rest[1..]
        }
        self.str(text)?;
        self.str("\"")
    }

    /// Block strings are read back verbatim, so the text only needs `"""`
    /// escaped. A trailing `"` or `\` would merge with the closing delimiter.
    fn description(&mut self, description: &Option<String>) -> fmt::Result {
        const TRIPLE_QUOTE: &str = "\"\"\"";
        const ESCAPED_TRIPLE_QUOTE: &str = "\\\"\"\"";

        let Some(mut description) = description.as_deref() else {
            return Ok(());
        };
        if description.ends_with('"') || description.ends_with('\\') {
            self.string(description)?;
        } else {
            self.str(TRIPLE_QUOTE)?;
            while let Some((before, after)) = description.split_once(TRIPLE_QUOTE) {
                self.str(before)?;
                self.str(ESCAPED_TRIPLE_QUOTE)?;
                description = after;
            }
            self.str(description)?;
            self.str(TRIPLE_QUOTE)?;
        }
        self.break_line()
    }
}

impl Print for SchemaDocument {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        p.definitions(&self.definitions)
    }
}

impl Print for QueryDocument {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let operations = self.operations.iter().map(|op| op as &dyn Print);
        let fragments = self.fragments.iter().map(|fragment| fragment as &dyn Print);
        p.definitions(operations.chain(fragments))
    }
}

impl Print for Definition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        match self {
            Definition::SchemaDefinition(def) => def.print(p),
            Definition::ScalarTypeDefinition(def) => def.print(p),
            Definition::ObjectTypeDefinition(def) => def.print(p),
            Definition::InterfaceTypeDefinition(def) => def.print(p),
            Definition::UnionTypeDefinition(def) => def.print(p),
            Definition::EnumTypeDefinition(def) => def.print(p),
            Definition::InputObjectTypeDefinition(def) => def.print(p),
            Definition::DirectiveDefinition(def) => def.print(p),
        }
    }
}

impl Print for OperationDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            operation_type,
            name,
            variables,
            directives,
            selection_set,
        } = self;
        // After another definition, a bare `{` would be read as part of it
        let shorthand = p.fresh
            && operation_type.is_query()
            && name.is_none()
            && variables.is_empty()
            && directives.is_empty();
        if !shorthand {
            p.str(operation_type.name())?;
            if let Some(name) = name {
                p.str(" ")?;
                p.str(name)?;
            }
            if !variables.is_empty() {
                p.list("(", ")", variables, |p, var| var.print(p))?;
            }
            directives.print(p)?;
            p.str(" ")?;
        }
        p.block(selection_set)
    }
}

impl Print for FragmentDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            name,
            type_condition,
            directives,
            selection_set,
        } = self;
        p.args(format_args!("fragment {name} on {type_condition}"))?;
        directives.print(p)?;
        p.str(" ")?;
        p.block(selection_set)
    }
}

impl Print for (OperationType, Name) {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let (operation_type, type_name) = self;
        p.args(format_args!("{operation_type}: {type_name}"))
    }
}

impl Print for SchemaDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            description,
            directives,
            root_operations,
        } = self;
        p.description(description)?;
        p.str("schema")?;
        directives.print(p)?;
        p.str(" ")?;
        p.block(root_operations)
    }
}

impl Print for ScalarTypeDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            description,
            name,
            directives,
        } = self;
        p.description(description)?;
        p.str("scalar ")?;
        p.str(name)?;
        directives.print(p)
    }
}

impl Print for ObjectTypeDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            description,
            name,
            implements_interfaces,
            directives,
            fields,
            extend,
        } = self;
        if *extend {
            p.str("extend type ")?;
        } else {
            p.description(description)?;
            p.str("type ")?;
        }
        p.fields_type(name, implements_interfaces, directives, fields)
    }
}

impl Print for InterfaceTypeDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            description,
            name,
            implements_interfaces,
            directives,
            fields,
        } = self;
        p.description(description)?;
        p.str("interface ")?;
        p.fields_type(name, implements_interfaces, directives, fields)
    }
}

impl Print for UnionTypeDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            description,
            name,
            directives,
            members,
        } = self;
        p.description(description)?;
        p.str("union ")?;
        p.str(name)?;
        directives.print(p)?;
        if !members.is_empty() {
            p.joined(" = ", " | ", "", members, |p, member| p.str(member))?;
        }
        Ok(())
    }
}

impl Print for EnumTypeDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            description,
            name,
            directives,
            values,
        } = self;
        p.description(description)?;
        p.str("enum ")?;
        p.str(name)?;
        directives.print(p)?;
        if !values.is_empty() {
            p.str(" ")?;
            p.block(values)?;
        }
        Ok(())
    }
}

impl Print for InputObjectTypeDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            description,
            name,
            directives,
            fields,
        } = self;
        p.description(description)?;
        p.str("input ")?;
        p.str(name)?;
        directives.print(p)?;
        if !fields.is_empty() {
            p.str(" ")?;
            p.block(fields)?;
        }
        Ok(())
    }
}

impl Print for DirectiveDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            description,
            name,
            arguments,
            repeatable,
            locations,
        } = self;
        p.description(description)?;
        p.str("directive @")?;
        p.str(name)?;
        p.arguments_definition(arguments)?;
        if *repeatable {
            p.str(" repeatable")?;
        }
        if !locations.is_empty() {
            p.joined(" on ", " | ", "", locations, |p, location| p.str(location.name()))?;
        }
        Ok(())
    }
}

impl Print for FieldDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            description,
            name,
            arguments,
            ty,
            directives,
        } = self;
        p.description(description)?;
        p.str(name)?;
        p.arguments_definition(arguments)?;
        p.args(format_args!(": {ty}"))?;
        directives.print(p)
    }
}

impl Print for InputValueDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            description,
            name,
            ty,
            default_value,
            directives,
        } = self;
        p.description(description)?;
        p.args(format_args!("{name}: {ty}"))?;
        if let Some(value) = default_value {
            p.str(" = ")?;
            value.print(p)?;
        }
        directives.print(p)
    }
}

impl Print for EnumValueDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            description,
            value,
            directives,
        } = self;
        p.description(description)?;
        p.str(value)?;
        directives.print(p)
    }
}

impl Print for VariableDefinition {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            name,
            ty,
            default_value,
            directives,
        } = self;
        p.args(format_args!("${name}: {ty}"))?;
        if let Some(value) = default_value {
            p.str(" = ")?;
            value.print(p)?;
        }
        directives.print(p)
    }
}

impl Print for DirectiveList {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        for directive in self {
            p.str(" ")?;
            directive.print(p)?;
        }
        Ok(())
    }
}

impl Print for Directive {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        p.str("@")?;
        p.str(&self.name)?;
        p.arguments(&self.arguments)
    }
}

impl Print for Selection {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        match self {
            Selection::Field(field) => field.print(p),
            Selection::FragmentSpread(spread) => spread.print(p),
            Selection::InlineFragment(inline) => inline.print(p),
        }
    }
}

impl Print for Field {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            alias,
            name,
            arguments,
            directives,
            selection_set,
        } = self;
        if let Some(alias) = alias {
            p.str(alias)?;
            p.str(": ")?;
        }
        p.str(name)?;
        p.arguments(arguments)?;
        directives.print(p)?;
        if !selection_set.is_empty() {
            p.str(" ")?;
            p.block(selection_set)?;
        }
        Ok(())
    }
}

impl Print for FragmentSpread {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        p.str("...")?;
        p.str(&self.fragment_name)?;
        self.directives.print(p)
    }
}

impl Print for InlineFragment {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        let Self {
            type_condition,
            directives,
            selection_set,
        } = self;
        p.str("...")?;
        if let Some(type_name) = type_condition {
            p.str(" on ")?;
            p.str(type_name)?;
        }
        directives.print(p)?;
        p.str(" ")?;
        p.block(selection_set)
    }
}

impl Print for Argument {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        p.str(&self.name)?;
        p.str(": ")?;
        self.value.print(p)
    }
}

impl Print for Value {
    fn print(&self, p: &mut Printer<'_, '_>) -> fmt::Result {
        match self {
            Value::Null => p.str("null"),
            Value::Boolean(true) => p.str("true"),
            Value::Boolean(false) => p.str("false"),
            Value::Enum(name) => p.str(name),
            Value::String(value) => p.string(value),
            Value::Variable(name) => p.args(format_args!("${name}")),
            Value::Float(value) | Value::Int(value) => p.str(value),
            Value::List(items) => p.list("[", "]", items, |p, item| item.print(p)),
            Value::Object(fields) => p.list("{", "}", fields, |p, (name, value)| {
                p.str(name)?;
                p.str(": ")?;
                value.print(p)
            }),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named(name) => write!(f, "{name}"),
            Type::List(inner) => write!(f, "[{inner}]"),
            Type::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

impl fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

macro_rules! display_as_graphql {
    ($($ty: ty),+ $(,)?) => {
        $(
            /// Prints as GraphQL syntax
            impl Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    self.print(&mut Printer::new(f))
                }
            }
        )+
    }
}

display_as_graphql!(
    SchemaDocument,
    QueryDocument,
    Definition,
    OperationDefinition,
    FragmentDefinition,
    SchemaDefinition,
    ScalarTypeDefinition,
    ObjectTypeDefinition,
    InterfaceTypeDefinition,
    UnionTypeDefinition,
    EnumTypeDefinition,
    InputObjectTypeDefinition,
    DirectiveDefinition,
    FieldDefinition,
    InputValueDefinition,
    EnumValueDefinition,
    VariableDefinition,
    DirectiveList,
    Directive,
    Selection,
    Field,
    FragmentSpread,
    InlineFragment,
    Argument,
    Value,
);

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn prints_query_shorthand() {
        let doc = QueryDocument::parse(
            r#"{ hero(episode: EMPIRE) { name ...on Droid { primaryFunction } friends @include(if: $all) { name } } } fragment F on Human { id }"#,
        )
        .unwrap();
        expect![[r#"
            {
              hero(episode: EMPIRE) {
                name
                ... on Droid {
                  primaryFunction
                }
                friends @include(if: $all) {
                  name
                }
              }
            }

            fragment F on Human {
              id
            }
        "#]]
        .assert_eq(&doc.to_string());
    }

    #[test]
    fn prints_named_operation() {
        let doc = QueryDocument::parse(
            r#"mutation Review($ep: Episode! = JEDI, $review: ReviewInput) { createReview(episode: $ep, review: $review) { stars commentary } }"#,
        )
        .unwrap();
        expect![[r#"
            mutation Review($ep: Episode! = JEDI, $review: ReviewInput) {
              createReview(episode: $ep, review: $review) {
                stars
                commentary
              }
            }
        "#]]
        .assert_eq(&doc.to_string());
    }

    #[test]
    fn prints_schema() {
        let doc = SchemaDocument::parse(
            r#"
            "A character"
            interface Character { id: ID! name: String }
            type Droid implements Character & Node @key(fields: "id") {
              id: ID!
              name(upper: Boolean = false, suffix: String = "\n"): String @deprecated
            }
            union SearchResult = Droid | Human
            enum Episode { NEWHOPE EMPIRE JEDI }
            input ReviewInput { stars: Int! tags: [String!] = ["a", "b"] }
            directive @auth(requires: Role = ADMIN) repeatable on OBJECT | FIELD_DEFINITION
            extend type Droid { primaryFunction: String }
            "#,
        )
        .unwrap();
        expect![[r#"
            """A character"""
            interface Character {
              id: ID!
              name: String
            }

            type Droid implements Character & Node @key(fields: "id") {
              id: ID!
              name(upper: Boolean = false, suffix: String = "\n"): String @deprecated
            }

            union SearchResult = Droid | Human

            enum Episode {
              NEWHOPE
              EMPIRE
              JEDI
            }

            input ReviewInput {
              stars: Int!
              tags: [String!] = ["a", "b"]
            }

            directive @auth(requires: Role = ADMIN) repeatable on OBJECT | FIELD_DEFINITION

            extend type Droid {
              primaryFunction: String
            }
        "#]]
        .assert_eq(&doc.to_string());
    }

    #[test]
    fn described_arguments_go_one_per_line() {
        let doc = SchemaDocument::parse(
            r#"
            type Query {
              search("Text to look for" text: String!, limit: Int = 10, filter: Filter = {tags: ["a"], nested: {on: true}}): [Result]
            }
            "#,
        )
        .unwrap();
        expect![[r#"
            type Query {
              search(
                """Text to look for"""
                text: String!
                limit: Int = 10
                filter: Filter = {tags: ["a"], nested: {on: true}}
              ): [Result]
            }
        "#]]
        .assert_eq(&doc.to_string());
    }

    #[test]
    fn string_escapes() {
        let value = Value::String("say \"hi\"\n\u{1}".into());
        assert_eq!(value.to_string(), r#""say \"hi\"\n\u0001""#);
    }
}
