use chrono::{DateTime, Utc};
use tracing::info;

use brokerdesk_core::{AppointmentId, DomainError, PersonId};
use brokerdesk_parties::PersonKind;
use brokerdesk_scheduling::{Appointment, Calendar, NewAppointment};

use super::Office;
use crate::books::Books;
use crate::error::OfficeResult;

fn ensure_free(
    books: &Books,
    provider_id: Option<PersonId>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    except: Option<AppointmentId>,
) -> OfficeResult<()> {
    let Some(provider_id) = provider_id else {
        return Ok(());
    };
    let calendar = Calendar::new(books.appointments.values());
    if let Some(clash) = calendar.clashes(provider_id, starts_at, ends_at, except).first() {
        return Err(DomainError::conflict(format!(
            "{} is busy with \"{}\" from {} to {}",
            books.person_name(provider_id),
            clash.title(),
            clash.starts_at(),
            clash.ends_at()
        ))
        .into());
    }
    Ok(())
}

impl Office {
    pub fn schedule_appointment(&self, input: NewAppointment) -> OfficeResult<AppointmentId> {
        self.transact("schedule_appointment", |books, now| {
            books.person(input.person_id)?;
            if let Some(provider_id) = input.provider_id {
                if books.person(provider_id)?.kind() != PersonKind::Provider {
                    return Err(DomainError::validation(format!(
                        "{} is not a provider",
                        books.person_name(provider_id)
                    ))
                    .into());
                }
            }
            if let Some(order_id) = input.order_id {
                books.order(order_id)?;
            }
            ensure_free(books, input.provider_id, input.starts_at, input.ends_at, None)?;

            let id = AppointmentId::new();
            let appointment = Appointment::new(id, input, now)?;
            info!(
                appointment_id = %id,
                starts_at = %appointment.starts_at(),
                "appointment scheduled"
            );
            books.appointments.upsert(id, appointment);
            Ok(id)
        })
    }

    pub fn reschedule_appointment(
        &self,
        id: AppointmentId,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> OfficeResult<()> {
        self.transact("reschedule_appointment", |books, now| {
            let provider_id = books.appointments.require(&id, "appointment")?.provider_id();
            ensure_free(books, provider_id, starts_at, ends_at, Some(id))?;
            books
                .appointments
                .require_mut(&id, "appointment")?
                .reschedule(starts_at, ends_at, now)?;
            Ok(())
        })
    }

    pub fn complete_appointment(&self, id: AppointmentId) -> OfficeResult<()> {
        self.transact("complete_appointment", |books, now| {
            books.appointments.require_mut(&id, "appointment")?.complete(now)?;
            Ok(())
        })
    }

    pub fn cancel_appointment(&self, id: AppointmentId) -> OfficeResult<()> {
        self.transact("cancel_appointment", |books, now| {
            books.appointments.require_mut(&id, "appointment")?.cancel(now)?;
            Ok(())
        })
    }

    /// Scheduled appointments overlapping `[from, to)`, earliest first.
    pub fn appointments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> OfficeResult<Vec<Appointment>> {
        self.read(|books| {
            Calendar::new(books.appointments.values())
                .between(from, to)
                .into_iter()
                .cloned()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::office::OfficeSettings;
    use brokerdesk_parties::NewPerson;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 11, 3, hour, 0, 0).unwrap()
    }

    fn setup() -> (Office, PersonId, PersonId) {
        let office = Office::new(OfficeSettings::default());
        let client = office.register_person(NewPerson::client("Adam Mazur")).unwrap();
        let notary = office.register_person(NewPerson::provider("Notariusz Kamińska")).unwrap();
        (office, client, notary)
    }

    fn visit(client: PersonId, provider: PersonId, from: u32, to: u32) -> NewAppointment {
        NewAppointment {
            person_id: client,
            provider_id: Some(provider),
            order_id: None,
            title: "Podpisanie aktu".to_string(),
            location: None,
            starts_at: at(from),
            ends_at: at(to),
            note: None,
        }
    }

    #[test]
    fn overlapping_visit_with_same_provider_is_rejected() {
        let (office, client, notary) = setup();
        office.schedule_appointment(visit(client, notary, 10, 11)).unwrap();

        let err = office.schedule_appointment(visit(client, notary, 10, 12)).unwrap_err();
        assert!(err.is_conflict());
        office.schedule_appointment(visit(client, notary, 11, 12)).unwrap();
    }

    #[test]
    fn client_cannot_be_booked_as_provider() {
        let (office, client, _) = setup();
        let err = office.schedule_appointment(visit(client, client, 9, 10)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn rescheduling_ignores_the_moved_appointment() {
        let (office, client, notary) = setup();
        let id = office.schedule_appointment(visit(client, notary, 10, 11)).unwrap();
        office.reschedule_appointment(id, at(10) + Duration::minutes(30), at(12)).unwrap();

        let other = office.schedule_appointment(visit(client, notary, 13, 14)).unwrap();
        assert!(office.reschedule_appointment(other, at(11), at(13)).unwrap_err().is_conflict());

        office.cancel_appointment(id).unwrap();
        office.reschedule_appointment(other, at(11), at(13)).unwrap();
        let day = office.appointments_between(at(0), at(23)).unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].starts_at(), at(11));
    }
}
