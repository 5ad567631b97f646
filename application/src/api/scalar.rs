//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute.
///
/// Represents the target type as a GraphQL string, going through the
/// [`FromStr`] and [`Display`] impls of the `As` domain type, so the domain
/// validation applies to the GraphQL input too.
///
/// Target type must implement [`TryFrom`] and [`AsRef`] for `As` type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Converts the target type into a string [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Constructs the target type from a string [`InputValue`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the input value is not a string;
    /// - the input value cannot be parsed into `As` type;
    /// - the parsed value cannot be converted into the target type.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let name = T::name(&()).unwrap_or("scalar");
        let s = input.as_string_value().ok_or_else(|| {
            format!("Expected `{name}` string, found: {input}")
        })?;
        s.parse::<As>()
            .map_err(|e| format!("Invalid `{name}` \"{s}\": {e}"))?
            .try_into()
            .map_err(|e| format!("Invalid `{name}`: {e}"))
    }

    /// Parses the provided [`ScalarToken`] as a [`String`].
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a string.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue, Value};

    use super::Via;
    use crate::api::{property::Title, user};

    type V<T> = Via<T>;

    #[test]
    fn parses_through_domain_type() {
        let input = InputValue::<DefaultScalarValue>::scalar("  Sea view ");
        let title: Title =
            V::<service::domain::property::Title>::from_input(&input)
                .unwrap();

        assert_eq!(title.to_string(), "Sea view");
        assert_eq!(
            V::<service::domain::property::Title>::to_output::<
                _,
                DefaultScalarValue,
            >(&title),
            Value::scalar("Sea view".to_owned()),
        );
    }

    #[test]
    fn rejects_invalid_input() {
        let blank = InputValue::<DefaultScalarValue>::scalar("   ");
        assert!(V::<service::domain::property::Title>::from_input::<
            Title,
            _,
        >(&blank)
        .is_err());

        let number = InputValue::<DefaultScalarValue>::scalar(42);
        assert!(V::<service::domain::user::Id>::from_input::<user::Id, _>(
            &number,
        )
        .is_err());

        let id = InputValue::<DefaultScalarValue>::scalar("42");
        assert!(V::<service::domain::user::Id>::from_input::<user::Id, _>(
            &id,
        )
        .is_ok());
    }
}
