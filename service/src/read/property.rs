//! [`Property`]-related read definitions.

#[cfg(doc)]
use crate::domain::Property;
use crate::domain::user;

/// Selector of [`Property`]s listed by an owner.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OfOwner(pub user::Id);

pub mod search {
    //! [`Property`] search definitions.
    //!
    //! Optional search [`Criteria`] are compiled into a [`Filter`]: a tree of
    //! typed [`Predicate`]s combined with explicit [`Filter::All`] and
    //! [`Filter::Any`] nodes. Each storage compiles the [`Filter`] into its
    //! own query form.

    use common::{define_pagination, Money};
    use derive_more::{Display, From, Into};

    use crate::domain::{
        property::{self, Amenities, Amenity},
        Property,
    };

    define_pagination!(Summary, Filter);

    /// Criteria of a [`Property`] search.
    ///
    /// Absent criteria impose no constraint.
    #[derive(Clone, Debug, Default)]
    pub struct Criteria {
        /// Text to look for in a city, country or title of a [`Property`].
        pub destination: Option<String>,

        /// Lowest acceptable [`property::NightlyRate`], inclusive.
        pub min_price: Option<Money>,

        /// Highest acceptable [`property::NightlyRate`], inclusive.
        pub max_price: Option<Money>,

        /// Required [`property::Kind`].
        pub kind: Option<property::Kind>,

        /// [`Amenity`]s a [`Property`] must provide, all of them.
        pub amenities: Amenities,
    }

    impl Criteria {
        /// Compiles these [`Criteria`] into a [`Filter`].
        #[must_use]
        pub fn compile(self) -> Filter {
            let Self {
                destination,
                min_price,
                max_price,
                kind,
                amenities,
            } = self;

            let mut all = vec![];
            if let Some(needle) = destination.as_deref().and_then(Needle::new) {
                all.push(Filter::Any(
                    Field::ALL
                        .into_iter()
                        .map(|f| Predicate::Contains(f, needle.clone()).into())
                        .collect(),
                ));
            }
            if let Some(min) = min_price {
                all.push(Predicate::MinRate(min).into());
            }
            if let Some(max) = max_price {
                all.push(Predicate::MaxRate(max).into());
            }
            if let Some(kind) = kind {
                all.push(Predicate::Kind(kind).into());
            }
            all.extend(amenities.iter().map(|a| Predicate::Amenity(a).into()));

            Filter::All(all)
        }
    }

    /// Composition of [`Predicate`]s.
    #[derive(Clone, Debug, Eq, From, PartialEq)]
    pub enum Filter {
        /// Single [`Predicate`].
        Where(Predicate),

        /// Conjunction of the inner [`Filter`]s. Empty one matches anything.
        #[from(ignore)]
        All(Vec<Filter>),

        /// Disjunction of the inner [`Filter`]s. Empty one matches nothing.
        #[from(ignore)]
        Any(Vec<Filter>),
    }

    impl Default for Filter {
        fn default() -> Self {
            Self::All(vec![])
        }
    }

    impl Filter {
        /// Checks whether the provided [`Property`] passes this [`Filter`].
        #[must_use]
        pub fn matches(&self, property: &Property) -> bool {
            match self {
                Self::Where(p) => p.matches(property),
                Self::All(fs) => fs.iter().all(|f| f.matches(property)),
                Self::Any(fs) => fs.iter().any(|f| f.matches(property)),
            }
        }
    }

    /// Atomic condition upon a [`Property`].
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum Predicate {
        /// [`Field`] contains the [`Needle`], ignoring case.
        Contains(Field, Needle),

        /// [`property::NightlyRate`] is not lower than the provided one.
        MinRate(Money),

        /// [`property::NightlyRate`] is not higher than the provided one.
        MaxRate(Money),

        /// [`property::Kind`] is exactly the provided one.
        Kind(property::Kind),

        /// [`Amenity`] is provided.
        Amenity(Amenity),
    }

    impl Predicate {
        /// Checks whether the provided [`Property`] satisfies this
        /// [`Predicate`].
        #[must_use]
        pub fn matches(&self, property: &Property) -> bool {
            match self {
                Self::Contains(field, needle) => field
                    .value(property)
                    .to_lowercase()
                    .contains(needle.as_str()),
                Self::MinRate(min) => property.nightly_rate.amount() >= *min,
                Self::MaxRate(max) => property.nightly_rate.amount() <= *max,
                Self::Kind(kind) => property.kind == *kind,
                Self::Amenity(a) => property.amenities.contains(*a),
            }
        }
    }

    /// Searchable text field of a [`Property`].
    #[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
    pub enum Field {
        /// [`property::City`].
        City,

        /// [`property::Country`].
        Country,

        /// [`property::Title`].
        Title,
    }

    impl Field {
        /// All the searchable [`Field`]s.
        pub const ALL: [Self; 3] = [Self::City, Self::Country, Self::Title];

        /// Returns the value of this [`Field`] in the provided [`Property`].
        #[must_use]
        pub fn value(self, property: &Property) -> &str {
            match self {
                Self::City => property.city.as_ref(),
                Self::Country => property.country.as_ref(),
                Self::Title => property.title.as_ref(),
            }
        }
    }

    /// Lowercased non-blank text to look for.
    #[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
    pub struct Needle(String);

    impl Needle {
        /// Creates a new [`Needle`] out of the provided `text`, unless it's
        /// blank.
        #[must_use]
        pub fn new(text: &str) -> Option<Self> {
            let text = text.trim();
            (!text.is_empty()).then(|| Self(text.to_lowercase()))
        }

        /// Returns the text of this [`Needle`].
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    /// [`Property`] in a search [`Page`].
    #[derive(Clone, Debug)]
    pub struct Summary {
        /// Found [`Property`] along with its [`Amenities`].
        pub property: Property,

        /// Representative image of the [`Property`]: the first one added.
        pub image: Option<property::ImageUrl>,
    }

    /// Total count of [`Property`]s matching a [`Filter`].
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(u64);

    #[cfg(test)]
    mod spec {
        use std::str::FromStr as _;

        use common::{DateTime, Money};

        use crate::domain::{
            property::{self, Amenity},
            user, Property,
        };

        use super::{Criteria, Field, Filter, Needle, Predicate};

        fn property(city: &str, rate: &str, amenities: &[Amenity]) -> Property {
            Property {
                id: property::Id::new(),
                owner_id: user::Id::from(1),
                title: property::Title::new("Cosy loft").unwrap(),
                country: property::Country::new("France").unwrap(),
                city: property::City::new(city).unwrap(),
                address: property::Address::new("1 Main St").unwrap(),
                description: property::Description::new("").unwrap(),
                nightly_rate: property::NightlyRate::new(
                    Money::from_str(rate).unwrap(),
                )
                .unwrap(),
                kind: property::Kind::Apartment,
                amenities: amenities.iter().copied().collect(),
                created_at: DateTime::now().coerce(),
            }
        }

        fn money(s: &str) -> Option<Money> {
            Some(Money::from_str(s).unwrap())
        }

        #[test]
        fn empty_criteria_match_anything() {
            let filter = Criteria::default().compile();

            assert_eq!(filter, Filter::All(vec![]));
            assert!(filter.matches(&property("Paris", "10", &[])));
        }

        #[test]
        fn blank_destination_is_ignored() {
            let filter = Criteria {
                destination: Some("   ".into()),
                ..Criteria::default()
            }
            .compile();

            assert_eq!(filter, Filter::All(vec![]));
        }

        #[test]
        fn destination_matches_any_field() {
            let filter = Criteria {
                destination: Some(" pAR ".into()),
                ..Criteria::default()
            }
            .compile();

            let needle = Needle::new("par").unwrap();
            assert_eq!(
                filter,
                Filter::All(vec![Filter::Any(
                    Field::ALL
                        .into_iter()
                        .map(|f| Predicate::Contains(f, needle.clone()).into())
                        .collect(),
                )]),
            );
            assert!(filter.matches(&property("Paris", "10", &[])));
            assert!(!filter.matches(&property("Lyon", "10", &[])));

            let by_country = Criteria {
                destination: Some("FRANCE".into()),
                ..Criteria::default()
            }
            .compile();
            assert!(by_country.matches(&property("Lyon", "10", &[])));
        }

        #[test]
        fn price_bounds_are_inclusive() {
            let filter = Criteria {
                min_price: money("100"),
                max_price: money("200"),
                ..Criteria::default()
            }
            .compile();

            assert!(filter.matches(&property("Paris", "100", &[])));
            assert!(filter.matches(&property("Paris", "200.00", &[])));
            assert!(!filter.matches(&property("Paris", "99.99", &[])));
            assert!(!filter.matches(&property("Paris", "200.01", &[])));
        }

        #[test]
        fn inverted_price_bounds_match_nothing() {
            let filter = Criteria {
                min_price: money("300"),
                max_price: money("100"),
                ..Criteria::default()
            }
            .compile();

            assert!(!filter.matches(&property("Paris", "200", &[])));
        }

        #[test]
        fn amenities_compose_with_and() {
            let filter = Criteria {
                amenities: [Amenity::Wifi, Amenity::Pool].into_iter().collect(),
                ..Criteria::default()
            }
            .compile();

            assert!(filter.matches(&property(
                "Paris",
                "10",
                &[Amenity::Wifi, Amenity::Pool, Amenity::Tv],
            )));
            assert!(!filter.matches(&property("Paris", "10", &[Amenity::Wifi])));
            assert!(!filter.matches(&property("Paris", "10", &[])));
        }

        #[test]
        fn kind_is_exact() {
            let filter = Criteria {
                kind: Some(property::Kind::House),
                ..Criteria::default()
            }
            .compile();

            assert!(!filter.matches(&property("Paris", "10", &[])));
        }

        #[test]
        fn empty_any_matches_nothing() {
            assert!(!Filter::Any(vec![]).matches(&property("Paris", "1", &[])));
        }
    }
}
