//! [`Query`] collection related to multiple [`Property`]s.

use common::operations::{By, Select};
use smart_default::SmartDefault;
use tracerr::Traced;

use crate::{
    domain::Property,
    infra::{database, Database},
    read::property::{search, OfOwner},
    Service,
};

use super::{DatabaseQuery, Query};

/// Queries [`Property`]s listed by an owner, newest first.
pub type OfOwnerList = DatabaseQuery<By<Vec<Property>, OfOwner>>;

/// Configuration of [`Search`] [`Query`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Page size used when none (or a non-positive one) is requested.
    #[default(20)]
    pub default_page_size: u32,

    /// Largest allowed page size.
    #[default(100)]
    pub max_page_size: u32,
}

/// [`Query`] searching [`Property`]s, newest first.
///
/// A page past the last one is empty but still reports the totals.
#[derive(Clone, Debug, Default)]
pub struct Search {
    /// [`search::Criteria`] the found [`Property`]s must satisfy.
    pub criteria: search::Criteria,

    /// Number of the requested page, starting from `1`.
    pub page: Option<i32>,

    /// Number of [`Property`]s on a single page.
    pub per_page: Option<i32>,
}

impl<Db> Query<Search> for Service<Db>
where
    Db: Database<
        Select<By<search::Page, search::Selector>>,
        Ok = search::Page,
        Err = Traced<database::Error>,
    >,
{
    type Ok = search::Page;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, q: Search) -> Result<Self::Ok, Self::Err> {
        let Search {
            criteria,
            page,
            per_page,
        } = q;
        let config = self.config().search;

        let arguments = search::Arguments::new(
            page,
            per_page,
            config.default_page_size,
        )
        .with_max_per_page(config.max_page_size);

        self.database()
            .execute(Select(By::new(search::Selector {
                arguments,
                filter: criteria.compile(),
            })))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`Search`] [`Query`] execution.
pub type ExecutionError = database::Error;

#[cfg(test)]
mod spec {
    use std::{collections::HashSet, str::FromStr as _};

    use common::Money;
    use proptest::prelude::*;

    use crate::{
        command::{AddPropertyImage, CreateProperty},
        domain::{
            property::{self, Amenity},
            user,
        },
        infra::Memory,
        read::property::{search::Criteria, OfOwner},
        Command as _, Config, Query as _, Service,
    };

    use super::{OfOwnerList, Search};

    async fn list(
        svc: &Service<Memory>,
        city: &str,
        rate: &str,
        amenities: &[Amenity],
    ) -> property::Id {
        svc.execute(CreateProperty {
            owner_id: user::Id::from(1),
            title: property::Title::new("Flat").unwrap(),
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
        })
        .await
        .unwrap()
        .id
    }

    fn paris_with_wifi() -> Criteria {
        Criteria {
            destination: Some("Paris".into()),
            min_price: Some(Money::from_str("100").unwrap()),
            amenities: [Amenity::Wifi].into_iter().collect(),
            ..Criteria::default()
        }
    }

    #[tokio::test]
    async fn pages_matching_properties() {
        let svc = Service::new(Config::default(), Memory::new());
        for _ in 0..45 {
            _ = list(&svc, "Paris", "150", &[Amenity::Wifi]).await;
        }
        _ = list(&svc, "Paris", "50", &[Amenity::Wifi]).await;
        _ = list(&svc, "Paris", "150", &[]).await;
        _ = list(&svc, "Lyon", "150", &[Amenity::Wifi]).await;

        let page = svc
            .execute(Search {
                criteria: paris_with_wifi(),
                page: Some(1),
                per_page: Some(20),
            })
            .await
            .unwrap();

        assert_eq!(page.items.len(), 20);
        assert_eq!(page.total_count, 45);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 1);

        let last = svc
            .execute(Search {
                criteria: paris_with_wifi(),
                page: Some(3),
                per_page: Some(20),
            })
            .await
            .unwrap();
        assert_eq!(last.items.len(), 5);
    }

    #[tokio::test]
    async fn page_past_end_is_empty() {
        let svc = Service::new(Config::default(), Memory::new());
        for _ in 0..3 {
            _ = list(&svc, "Paris", "150", &[]).await;
        }

        let page = svc
            .execute(Search {
                page: Some(7),
                ..Search::default()
            })
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 7);
    }

    #[tokio::test]
    async fn defaults_and_clamps_page_size() {
        let svc = Service::new(Config::default(), Memory::new());
        for _ in 0..25 {
            _ = list(&svc, "Paris", "150", &[]).await;
        }

        let page = svc
            .execute(Search {
                page: Some(0),
                per_page: Some(-5),
                ..Search::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 20);
        assert_eq!(page.current_page, 1);

        let page = svc
            .execute(Search {
                per_page: Some(1000),
                ..Search::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 25);
    }

    #[tokio::test]
    async fn includes_properties_without_amenities() {
        let svc = Service::new(Config::default(), Memory::new());
        let bare = list(&svc, "Paris", "150", &[]).await;

        let page = svc
            .execute(Search {
                criteria: Criteria {
                    destination: Some("  paris ".into()),
                    ..Criteria::default()
                },
                ..Search::default()
            })
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].property.id, bare);
        assert!(page.items[0].property.amenities.is_empty());
        assert!(page.items[0].image.is_none());
    }

    #[tokio::test]
    async fn first_added_image_represents_property() {
        let svc = Service::new(Config::default(), Memory::new());
        let id = list(&svc, "Lyon", "90", &[]).await;
        for url in ["http://b/2.png", "http://a/1.png"] {
            _ = svc
                .execute(AddPropertyImage {
                    property_id: id,
                    requester_id: user::Id::from(1),
                    url: property::ImageUrl::new(url).unwrap(),
                })
                .await
                .unwrap();
        }

        let page = svc.execute(Search::default()).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(
            page.items[0].image.as_ref().map(ToString::to_string),
            Some("http://b/2.png".to_owned()),
        );
    }

    #[tokio::test]
    async fn lists_properties_of_owner() {
        let svc = Service::new(Config::default(), Memory::new());
        let first = list(&svc, "Paris", "100", &[]).await;
        let second = list(&svc, "Nice", "120", &[]).await;

        let own = svc
            .execute(OfOwnerList::by(OfOwner(user::Id::from(1))))
            .await
            .unwrap();
        assert_eq!(
            own.iter().map(|p| p.id).collect::<HashSet<_>>(),
            HashSet::from([first, second]),
        );
        assert!(own.windows(2).all(|w| {
            (w[0].created_at, w[0].id) >= (w[1].created_at, w[1].id)
        }));

        let others = svc
            .execute(OfOwnerList::by(OfOwner(user::Id::from(2))))
            .await
            .unwrap();
        assert!(others.is_empty());
    }

    proptest! {
        #[test]
        fn pages_partition_results(total in 0_usize..40, per_page in 1_i32..12) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async {
                let svc = Service::new(Config::default(), Memory::new());
                let mut listed = HashSet::new();
                for _ in 0..total {
                    _ = listed.insert(list(&svc, "Paris", "150", &[]).await);
                }

                let mut seen = vec![];
                let mut page_num = 1;
                loop {
                    let page = svc
                        .execute(Search {
                            page: Some(page_num),
                            per_page: Some(per_page),
                            ..Search::default()
                        })
                        .await
                        .unwrap();
                    assert_eq!(page.total_count, total as u64);
                    if page.items.is_empty() {
                        break;
                    }
                    seen.extend(page.items.into_iter().map(|s| s.property.id));
                    page_num += 1;
                }

                assert_eq!(seen.len(), total);
                assert_eq!(seen.into_iter().collect::<HashSet<_>>(), listed);
            });
        }
    }
}
