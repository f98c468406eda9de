use rust_decimal::Decimal;
use tracing::info;

use brokerdesk_catalog::{Service, Status};
use brokerdesk_core::{ExpectedVersion, PersonId, ServiceId, StatusId, VatRate};
use brokerdesk_parties::{NewPerson, Person, PersonChanges};

use super::{Office, check_version};
use crate::error::OfficeResult;

impl Office {
    pub fn register_person(&self, input: NewPerson) -> OfficeResult<PersonId> {
        self.transact("register_person", |books, now| {
            let id = PersonId::new();
            let person = Person::register(id, input, now)?;
            info!(person_id = %id, name = person.name(), "person registered");
            books.persons.upsert(id, person);
            Ok(id)
        })
    }

    pub fn update_person(
        &self,
        id: PersonId,
        changes: PersonChanges,
        expected: ExpectedVersion,
    ) -> OfficeResult<()> {
        self.transact("update_person", |books, now| {
            let person = books.persons.require_mut(&id, "person")?;
            check_version(person, expected)?;
            person.update(changes, now)?;
            Ok(())
        })
    }

    /// Inactive persons keep their documents but cannot appear on new ones.
    pub fn deactivate_person(&self, id: PersonId) -> OfficeResult<()> {
        self.transact("deactivate_person", |books, now| {
            books.persons.require_mut(&id, "person")?.deactivate(now)?;
            Ok(())
        })
    }

    pub fn reactivate_person(&self, id: PersonId) -> OfficeResult<()> {
        self.transact("reactivate_person", |books, now| {
            books.persons.require_mut(&id, "person")?.reactivate(now);
            Ok(())
        })
    }

    pub fn add_status(&self, name: &str, closed: bool) -> OfficeResult<StatusId> {
        self.transact("add_status", |books, _| {
            let id = StatusId::new();
            let position = books.statuses.values().map(Status::position).max().map_or(0, |p| p + 1);
            books.statuses.upsert(id, Status::new(id, name, closed, position)?);
            Ok(id)
        })
    }

    /// Add a service to the price list; `vat_rate` defaults to the office rate.
    pub fn add_service(
        &self,
        name: &str,
        unit: &str,
        price: Decimal,
        vat_rate: Option<VatRate>,
    ) -> OfficeResult<ServiceId> {
        let vat_rate = vat_rate.unwrap_or(self.settings().vat_rate);
        self.transact("add_service", |books, _| {
            let id = ServiceId::new();
            books.services.upsert(id, Service::new(id, name, unit, price, vat_rate)?);
            Ok(id)
        })
    }

    pub fn set_service_price(&self, id: ServiceId, price: Decimal) -> OfficeResult<()> {
        self.transact("set_service_price", |books, _| {
            books.services.require_mut(&id, "service")?.set_price(price)?;
            Ok(())
        })
    }

    pub fn archive_service(&self, id: ServiceId) -> OfficeResult<()> {
        self.transact("archive_service", |books, _| {
            books.services.require_mut(&id, "service")?.archive();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::office::OfficeSettings;
    use brokerdesk_core::DomainError;
    use brokerdesk_parties::ContactInfo;

    #[test]
    fn stale_version_is_rejected() {
        let office = Office::new(OfficeSettings::default());
        let id = office.register_person(NewPerson::client("Jan Kowalski")).unwrap();

        let rename = |name: &str| PersonChanges {
            name: Some(name.to_string()),
            ..PersonChanges::default()
        };
        office
            .update_person(id, rename("Jan Nowak"), ExpectedVersion::Exact(1))
            .unwrap();
        let err = office
            .update_person(id, rename("Jan Zieliński"), ExpectedVersion::Exact(1))
            .unwrap_err();
        assert!(err.is_conflict());

        let name = office.read(|b| b.person_name(id).to_string()).unwrap();
        assert_eq!(name, "Jan Nowak");
    }

    #[test]
    fn failed_update_leaves_person_unchanged() {
        let office = Office::new(OfficeSettings::default());
        let id = office.register_person(NewPerson::client("Anna Wiśniewska")).unwrap();

        let err = office
            .update_person(
                id,
                PersonChanges {
                    name: Some("Anna Wójcik".to_string()),
                    contact: Some(ContactInfo {
                        email: Some("not-an-address".to_string()),
                        ..ContactInfo::default()
                    }),
                    ..PersonChanges::default()
                },
                ExpectedVersion::Any,
            )
            .unwrap_err();
        match err.as_domain() {
            Some(DomainError::Validation(_)) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(office.read(|b| b.person_name(id).to_string()).unwrap(), "Anna Wiśniewska");
    }

    #[test]
    fn statuses_are_appended_in_order() {
        let office = Office::new(OfficeSettings::default());
        let open = office.add_status("Przyjęte", false).unwrap();
        let done = office.add_status("Zakończone", true).unwrap();
        let (a, b) = office
            .read(|books| {
                (
                    books.statuses.get(&open).map(Status::position),
                    books.statuses.get(&done).map(Status::position),
                )
            })
            .unwrap();
        assert_eq!((a, b), (Some(0), Some(1)));
    }

    #[test]
    fn service_defaults_to_office_vat_rate() {
        let office = Office::new(OfficeSettings::default());
        let id = office
            .add_service("Tłumaczenie przysięgłe", "strona", Decimal::new(4500, 2), None)
            .unwrap();
        let rate = office.read(|b| b.services.get(&id).map(Service::vat_rate)).unwrap();
        assert_eq!(rate, Some(VatRate::default()));
    }
}
