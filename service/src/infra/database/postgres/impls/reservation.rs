//! [`Reservation`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Date, DateRange,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        property,
        reservation::{self, GuestCount},
        Reservation,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::reservation::{IsAvailable, IsReserved, OfGuest, OfHost, Slot},
};

/// Columns of the `reservations` table decoded by [`reservation_from_row`].
const COLUMNS: &str = "\
    id, property_id, guest_id, host_id, \
    start_date, end_date, guests, total_price, \
    eligibility, created_at";

/// Builds a [`Reservation`] out of the provided `reservations` table [`Row`].
///
/// # Panics
///
/// If the [`Row`] violates the table constraints.
fn reservation_from_row(row: &Row) -> Reservation {
    let start: Date = row.get("start_date");
    let end: Date = row.get("end_date");
    let guests: i32 = row.get("guests");

    Reservation {
        id: row.get("id"),
        property_id: row.get("property_id"),
        guest_id: row.get("guest_id"),
        host_id: row.get("host_id"),
        stay: DateRange::new(start, end)
            .expect("`CHECK (start_date < end_date)` constraint"),
        guests: GuestCount::new(guests).expect("`CHECK (guests > 0)` constraint"),
        total_price: row.get("total_price"),
        eligibility: row.get("eligibility"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<IsAvailable, Slot>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = IsAvailable;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<IsAvailable, Slot>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Slot { property_id, stay } = by.into_inner();

        const SQL: &str = "\
            SELECT NOT EXISTS (\
                SELECT 1 \
                FROM reservations \
                WHERE property_id = $1::UUID \
                  AND start_date < $3::DATE \
                  AND end_date > $2::DATE \
            ) AS available";
        let row = self
            .query_opt(SQL, &[&property_id, &stay.start(), &stay.end()])
            .await
            .map_err(tracerr::wrap!())?;

        Ok(IsAvailable(row.is_none_or(|r| r.get("available"))))
    }
}

impl<C> Database<Select<By<IsReserved, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = IsReserved;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<IsReserved, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let property_id: property::Id = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 \
                FROM reservations \
                WHERE property_id = $1::UUID \
            ) AS reserved";
        let row = self
            .query_opt(SQL, &[&property_id])
            .await
            .map_err(tracerr::wrap!())?;

        Ok(IsReserved(row.is_some_and(|r| r.get("reserved"))))
    }
}

impl<C> Database<Insert<Reservation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(reservation): Insert<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        let Reservation {
            id,
            property_id,
            guest_id,
            host_id,
            stay,
            guests,
            total_price,
            eligibility,
            created_at,
        } = reservation;
        let guests = i32::from(guests.get());

        const SQL: &str = "\
            INSERT INTO reservations (\
                id, property_id, guest_id, host_id, \
                start_date, end_date, guests, total_price, \
                eligibility, created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::INT8, $4::INT8, \
                $5::DATE, $6::DATE, $7::INT4, $8::NUMERIC, \
                $9::INT2, $10::TIMESTAMPTZ \
            )";
        self.exec(
            SQL,
            &[
                &id,
                &property_id,
                &guest_id,
                &host_id,
                &stay.start(),
                &stay.end(),
                &guests,
                &total_price,
                &eligibility,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Reservation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(reservation): Update<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE reservations \
            SET eligibility = $2::INT2 \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&reservation.id, &reservation.eligibility])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Option<Reservation>, reservation::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Reservation>, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: reservation::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM reservations \
             WHERE id = $1::UUID",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(reservation_from_row))
    }
}

impl<C> Database<Lock<By<Reservation, reservation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Reservation, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: reservation::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM reservations \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Reservation>, OfGuest>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Reservation>, OfGuest>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfGuest(guest_id) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM reservations \
             WHERE guest_id = $1::INT8 \
             ORDER BY created_at DESC, id DESC",
        );
        Ok(self
            .query(sql.as_str(), &[&guest_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(reservation_from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Reservation>, OfHost>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Reservation>, OfHost>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfHost(host_id) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM reservations \
             WHERE host_id = $1::INT8 \
             ORDER BY created_at DESC, id DESC",
        );
        Ok(self
            .query(sql.as_str(), &[&host_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(reservation_from_row)
            .collect())
    }
}
