//! [`Property`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        property::{self, Amenities},
        Property,
    },
    infra::{
        database::{
            self,
            postgres::{predicate, Connection},
            Postgres,
        },
        Database,
    },
    read::property::{search, OfOwner},
};

/// Builds a [`Property`] out of the provided `properties` table [`Row`] and
/// its [`Amenities`].
fn property_from_row(row: &Row, amenities: Amenities) -> Property {
    Property {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        country: row.get("country"),
        city: row.get("city"),
        address: row.get("address"),
        description: row.get("description"),
        nightly_rate: row.get("nightly_rate"),
        kind: row.get("kind"),
        amenities,
        created_at: row.get("created_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<property::Id, Property>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[property::Id]>,
{
    type Ok = HashMap<property::Id, Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<property::Id, Property>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[property::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        const AMENITIES_SQL: &str = "\
            SELECT property_id, amenity \
            FROM property_amenities \
            WHERE property_id = ANY($1::UUID[])";
        let mut amenities = HashMap::<property::Id, Vec<property::Amenity>>::new();
        for row in self
            .query(AMENITIES_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
        {
            amenities
                .entry(row.get("property_id"))
                .or_default()
                .push(row.get("amenity"));
        }

        const SQL: &str = "\
            SELECT id, owner_id, \
                   title, country, city, address, description, \
                   nightly_rate, kind, created_at \
            FROM properties \
            WHERE id = ANY($1::UUID[])";
        Ok(self
            .query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                let amenities = amenities
                    .remove(&id)
                    .map(Amenities::from_iter)
                    .unwrap_or_default();
                (id, property_from_row(&row, amenities))
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Property>, property::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<property::Id, Property>, [property::Id; 1]>>,
        Ok = HashMap<property::Id, Property>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Property>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Property>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(property))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Property>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let Property {
            id,
            owner_id,
            title,
            country,
            city,
            address,
            description,
            nightly_rate,
            kind,
            amenities,
            created_at,
        } = property;

        const SQL: &str = "\
            INSERT INTO properties (\
                id, owner_id, \
                title, country, city, address, description, \
                nightly_rate, kind, created_at \
            ) VALUES (\
                $1::UUID, $2::INT8, \
                $3::VARCHAR, $4::VARCHAR, $5::VARCHAR, $6::VARCHAR, \
                $7::VARCHAR, \
                $8::NUMERIC, $9::INT2, $10::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET title = EXCLUDED.title, \
                country = EXCLUDED.country, \
                city = EXCLUDED.city, \
                address = EXCLUDED.address, \
                description = EXCLUDED.description, \
                nightly_rate = EXCLUDED.nightly_rate, \
                kind = EXCLUDED.kind";
        self.exec(
            SQL,
            &[
                &id,
                &owner_id,
                &title,
                &country,
                &city,
                &address,
                &description,
                &nightly_rate,
                &kind,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

        let amenities = amenities.iter().collect::<Vec<_>>();
        const AMENITIES_SQL: &str = "\
            WITH removed AS (\
                DELETE FROM property_amenities \
                WHERE property_id = $1::UUID \
                  AND amenity <> ALL($2::INT2[]) \
            ) \
            INSERT INTO property_amenities (property_id, amenity) \
            SELECT $1::UUID, unnest($2::INT2[]) \
            ON CONFLICT (property_id, amenity) DO NOTHING";
        self.exec(AMENITIES_SQL, &[&id, &amenities])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM properties \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        // Amenities and images are removed by `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM properties \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Property>, OfOwner>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<property::Id, Property>, Vec<property::Id>>>,
        Ok = HashMap<property::Id, Property>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, OfOwner>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfOwner(owner_id) = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM properties \
            WHERE owner_id = $1::INT8 \
            ORDER BY created_at DESC, id DESC";
        let ids = self
            .query(SQL, &[&owner_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect::<Vec<property::Id>>();

        let mut properties = self
            .execute(Select(By::new(ids.clone())))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(ids
            .into_iter()
            .filter_map(|id| properties.remove(&id))
            .collect())
    }
}

impl<C> Database<Insert<property::Image>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(image): Insert<property::Image>,
    ) -> Result<Self::Ok, Self::Err> {
        let property::Image {
            property_id,
            url,
            added_at,
        } = image;

        const SQL: &str = "\
            INSERT INTO property_images (property_id, url, added_at) \
            VALUES ($1::UUID, $2::VARCHAR, $3::TIMESTAMPTZ)";
        self.exec(SQL, &[&property_id, &url, &added_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<property::Image>, property::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<property::Image>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<property::Image>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let property_id: property::Id = by.into_inner();

        const SQL: &str = "\
            SELECT property_id, url, added_at \
            FROM property_images \
            WHERE property_id = $1::UUID \
            ORDER BY seq";
        Ok(self
            .query(SQL, &[&property_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| property::Image {
                property_id: row.get("property_id"),
                url: row.get("url"),
                added_at: row.get("added_at"),
            })
            .collect())
    }
}

impl<C> Database<Select<By<search::TotalCount, search::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = search::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<search::TotalCount, search::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let condition = predicate::Compiled::new(by.as_inner(), 0);
        let params = condition.params().collect::<Vec<_>>();

        let sql = format!(
            "SELECT COUNT(*) AS total \
             FROM properties p \
             WHERE {}",
            condition.sql,
        );
        let total = self
            .query_opt(sql.as_str(), &params)
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get::<_, i64>("total"));

        Ok(u64::try_from(total).unwrap_or_default().into())
    }
}

impl<C> Database<Select<By<search::Page, search::Selector>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
            Select<By<search::TotalCount, search::Filter>>,
            Ok = search::TotalCount,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<property::Id, Property>, Vec<property::Id>>>,
            Ok = HashMap<property::Id, Property>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = search::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<search::Page, search::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let search::Selector { arguments, filter } = by.into_inner();

        let total_count: u64 = self
            .execute(Select(By::<search::TotalCount, _>::new(filter.clone())))
            .await
            .map_err(tracerr::wrap!())?
            .into();
        if arguments.is_past_end(total_count) {
            return Ok(search::Page::new(
                &arguments,
                Vec::<search::Summary>::new(),
                total_count,
            ));
        }

        let limit = i64::from(arguments.per_page());
        let offset = i64::try_from(arguments.offset()).unwrap_or(i64::MAX);

        let condition = predicate::Compiled::new(&filter, 2);
        let mut params: Vec<&(dyn ToSql + Sync)> = vec![&limit, &offset];
        params.extend(condition.params());

        let sql = format!(
            "SELECT p.id \
             FROM properties p \
             WHERE {} \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $1::INT8 OFFSET $2::INT8",
            condition.sql,
        );
        let ids = self
            .query(sql.as_str(), &params)
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect::<Vec<property::Id>>();

        const IMAGES_SQL: &str = "\
            SELECT DISTINCT ON (property_id) property_id, url \
            FROM property_images \
            WHERE property_id = ANY($1::UUID[]) \
            ORDER BY property_id, seq";
        let mut images = self
            .query(IMAGES_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| (row.get("property_id"), row.get("url")))
            .collect::<HashMap<property::Id, property::ImageUrl>>();

        let mut properties = self
            .execute(Select(By::new(ids.clone())))
            .await
            .map_err(tracerr::wrap!())?;

        let items = ids
            .into_iter()
            .filter_map(|id| {
                Some(search::Summary {
                    property: properties.remove(&id)?,
                    image: images.remove(&id),
                })
            })
            .collect::<Vec<_>>();
        Ok(search::Page::new(&arguments, items, total_count))
    }
}
