//! [`Review`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{
        property,
        review::{Eligibility, Rating},
        Review,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::review::{Candidate, Eligible},
};

impl<C> Database<Insert<Review>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(review): Insert<Review>,
    ) -> Result<Self::Ok, Self::Err> {
        let Review {
            id,
            property_id,
            author_id,
            reservation_id,
            rating,
            comment,
            created_at,
        } = review;
        let rating = i16::from(rating.get());

        const SQL: &str = "\
            INSERT INTO reviews (\
                id, property_id, author_id, reservation_id, \
                rating, comment, created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::INT8, $4::UUID, \
                $5::INT2, $6::VARCHAR, $7::TIMESTAMPTZ \
            )";
        self.exec(
            SQL,
            &[
                &id,
                &property_id,
                &author_id,
                &reservation_id,
                &rating,
                &comment,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Review>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Review>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Review>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let property_id: property::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, property_id, author_id, reservation_id, \
                   rating, comment, created_at \
            FROM reviews \
            WHERE property_id = $1::UUID \
            ORDER BY created_at DESC, id DESC";
        Ok(self
            .query(SQL, &[&property_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Review {
                id: row.get("id"),
                property_id: row.get("property_id"),
                author_id: row.get("author_id"),
                reservation_id: row.get("reservation_id"),
                rating: Rating::new(row.get::<_, i16>("rating"))
                    .expect("`CHECK (rating BETWEEN 1 AND 5)` constraint"),
                comment: row.get("comment"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

impl<C> Database<Select<By<Eligible, Candidate>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Eligible;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Eligible, Candidate>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Candidate {
            guest_id,
            property_id,
        } = by.into_inner();

        const SQL: &str = "\
            SELECT r.id \
            FROM reservations r \
            WHERE r.guest_id = $1::INT8 \
              AND r.property_id = $2::UUID \
              AND r.eligibility = $3::INT2 \
              AND NOT EXISTS (\
                  SELECT 1 FROM reviews rv WHERE rv.reservation_id = r.id \
              ) \
            ORDER BY r.created_at, r.id \
            LIMIT 1";
        Ok(Eligible(
            self.query_opt(
                SQL,
                &[&guest_id, &property_id, &Eligibility::ReviewEnabled],
            )
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| row.get("id")),
        ))
    }
}
