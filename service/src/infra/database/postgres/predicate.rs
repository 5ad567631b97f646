//! Compilation of a search [`Filter`] into a SQL condition.

use itertools::Itertools as _;
use postgres_types::ToSql;

use crate::read::property::search::{Field, Filter, Predicate};

/// Owned SQL parameter.
type Param = Box<dyn ToSql + Send + Sync>;

/// SQL condition upon the `p` alias of the `properties` table, along with
/// its parameters.
#[derive(Debug)]
pub(super) struct Compiled {
    /// SQL text of the condition.
    pub(super) sql: String,

    /// Parameters the condition refers to.
    params: Vec<Param>,
}

impl Compiled {
    /// Compiles the provided [`Filter`], numbering its parameters after the
    /// first `offset` ones.
    pub(super) fn new(filter: &Filter, offset: usize) -> Self {
        let mut params = vec![];
        let sql = compile(filter, offset, &mut params);
        Self { sql, params }
    }

    /// Returns the parameters of this condition, in order.
    pub(super) fn params(&self) -> impl Iterator<Item = &(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| -> &(dyn ToSql + Sync) { p.as_ref() })
    }
}

/// Compiles the provided [`Filter`] recursively, collecting its parameters.
fn compile(filter: &Filter, offset: usize, params: &mut Vec<Param>) -> String {
    match filter {
        Filter::Where(p) => predicate(p, offset, params),
        Filter::All(fs) if fs.is_empty() => "TRUE".to_owned(),
        Filter::Any(fs) if fs.is_empty() => "FALSE".to_owned(),
        Filter::All(fs) => format!(
            "({})",
            fs.iter().map(|f| compile(f, offset, params)).join(" AND "),
        ),
        Filter::Any(fs) => format!(
            "({})",
            fs.iter().map(|f| compile(f, offset, params)).join(" OR "),
        ),
    }
}

/// Compiles the provided [`Predicate`], collecting its parameter.
fn predicate(p: &Predicate, offset: usize, params: &mut Vec<Param>) -> String {
    let mut bind = |param: Param| {
        params.push(param);
        offset + params.len()
    };

    match p {
        Predicate::Contains(field, needle) => {
            let n = bind(Box::new(like_pattern(needle.as_str())));
            format!("{} ILIKE ${n}::VARCHAR", column(*field))
        }
        Predicate::MinRate(min) => {
            let n = bind(Box::new(*min));
            format!("p.nightly_rate >= ${n}::NUMERIC")
        }
        Predicate::MaxRate(max) => {
            let n = bind(Box::new(*max));
            format!("p.nightly_rate <= ${n}::NUMERIC")
        }
        Predicate::Kind(kind) => {
            let n = bind(Box::new(*kind));
            format!("p.kind = ${n}::INT2")
        }
        Predicate::Amenity(amenity) => {
            let n = bind(Box::new(*amenity));
            format!(
                "EXISTS (SELECT 1 FROM property_amenities pa \
                         WHERE pa.property_id = p.id \
                           AND pa.amenity = ${n}::INT2)",
            )
        }
    }
}

/// Returns the column of the provided [`Field`].
fn column(field: Field) -> &'static str {
    match field {
        Field::City => "p.city",
        Field::Country => "p.country",
        Field::Title => "p.title",
    }
}

/// Creates a `LIKE` pattern matching the provided `text` literally anywhere.
fn like_pattern(text: &str) -> String {
    format!(
        "%{}%",
        text.replace('\\', r"\\")
            .replace('%', r"\%")
            .replace('_', r"\_"),
    )
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Money;

    use crate::{
        domain::property::{self, Amenity},
        read::property::search::{Criteria, Filter},
    };

    use super::{like_pattern, Compiled};

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(like_pattern("paris"), "%paris%");
        assert_eq!(like_pattern("100%_a\\b"), r"%100\%\_a\\b%");
    }

    #[test]
    fn compiles_empty_filters() {
        let all = Compiled::new(&Filter::All(vec![]), 0);
        assert_eq!(all.sql, "TRUE");
        assert_eq!(all.params().count(), 0);

        let any = Compiled::new(&Filter::Any(vec![]), 0);
        assert_eq!(any.sql, "FALSE");
    }

    #[test]
    fn compiles_criteria() {
        let filter = Criteria {
            destination: Some("Paris".into()),
            min_price: Some(Money::from_str("100").unwrap()),
            max_price: None,
            kind: Some(property::Kind::House),
            amenities: [Amenity::Wifi].into_iter().collect(),
        }
        .compile();

        let compiled = Compiled::new(&filter, 2);

        assert_eq!(
            compiled.sql,
            "((p.city ILIKE $3::VARCHAR \
               OR p.country ILIKE $4::VARCHAR \
               OR p.title ILIKE $5::VARCHAR) \
             AND p.nightly_rate >= $6::NUMERIC \
             AND p.kind = $7::INT2 \
             AND EXISTS (SELECT 1 FROM property_amenities pa \
                         WHERE pa.property_id = p.id \
                           AND pa.amenity = $8::INT2))",
        );
        assert_eq!(compiled.params().count(), 6);
    }
}
