use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brokerdesk_core::{
    AppointmentId, DomainError, DomainResult, Entity, OrderId, PersonId, Timestamps,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentState {
    Scheduled,
    Done,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub person_id: PersonId,
    /// Translator or notary attending; overlaps are checked per provider.
    pub provider_id: Option<PersonId>,
    pub order_id: Option<OrderId>,
    pub title: String,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    id: AppointmentId,
    person_id: PersonId,
    provider_id: Option<PersonId>,
    order_id: Option<OrderId>,
    title: String,
    location: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    state: AppointmentState,
    note: Option<String>,
    timestamps: Timestamps,
}

impl Appointment {
    pub fn new(id: AppointmentId, input: NewAppointment, now: DateTime<Utc>) -> DomainResult<Self> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("appointment title cannot be empty"));
        }
        validate_window(input.starts_at, input.ends_at)?;
        Ok(Self {
            id,
            person_id: input.person_id,
            provider_id: input.provider_id,
            order_id: input.order_id,
            title,
            location: input.location,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            state: AppointmentState::Scheduled,
            note: input.note,
            timestamps: Timestamps::new(now),
        })
    }

    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    pub fn provider_id(&self) -> Option<PersonId> {
        self.provider_id
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    pub fn state(&self) -> AppointmentState {
        self.state
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn is_scheduled(&self) -> bool {
        self.state == AppointmentState::Scheduled
    }

    /// Half-open interval overlap: back-to-back appointments do not clash.
    pub fn overlaps(&self, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> bool {
        self.starts_at < ends_at && starts_at < self.ends_at
    }

    pub fn reschedule(
        &mut self,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_scheduled()?;
        validate_window(starts_at, ends_at)?;
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self.timestamps.touch(now);
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_scheduled()?;
        self.state = AppointmentState::Done;
        self.timestamps.touch(now);
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_scheduled()?;
        self.state = AppointmentState::Cancelled;
        self.timestamps.touch(now);
        Ok(())
    }

    fn ensure_scheduled(&self) -> DomainResult<()> {
        if !self.is_scheduled() {
            return Err(DomainError::conflict(format!(
                "appointment is {:?}, not scheduled",
                self.state
            )));
        }
        Ok(())
    }
}

impl Entity for Appointment {
    type Id = AppointmentId;

    fn id(&self) -> AppointmentId {
        self.id
    }
}

fn validate_window(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> DomainResult<()> {
    if ends_at <= starts_at {
        return Err(DomainError::validation("appointment must end after it starts"));
    }
    Ok(())
}

/// View over a set of appointments.
pub struct Calendar<'a> {
    appointments: Vec<&'a Appointment>,
}

impl<'a> Calendar<'a> {
    pub fn new(appointments: impl IntoIterator<Item = &'a Appointment>) -> Self {
        Self {
            appointments: appointments.into_iter().collect(),
        }
    }

    /// Scheduled appointments of `provider_id` clashing with the window,
    /// ignoring `except` (the appointment being moved).
    pub fn clashes(
        &self,
        provider_id: PersonId,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        except: Option<AppointmentId>,
    ) -> Vec<&'a Appointment> {
        self.appointments
            .iter()
            .copied()
            .filter(|a| a.is_scheduled())
            .filter(|a| a.provider_id == Some(provider_id))
            .filter(|a| Some(a.id) != except)
            .filter(|a| a.overlaps(starts_at, ends_at))
            .collect()
    }

    /// Scheduled appointments overlapping `[from, to)`, ordered by start.
    pub fn between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<&'a Appointment> {
        let mut found: Vec<&'a Appointment> = self
            .appointments
            .iter()
            .copied()
            .filter(|a| a.is_scheduled() && a.overlaps(from, to))
            .collect();
        found.sort_by_key(|a| (a.starts_at, a.id));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 20, hour, 0, 0).unwrap()
    }

    fn input(provider: PersonId, from: u32, to: u32) -> NewAppointment {
        NewAppointment {
            person_id: PersonId::new(),
            provider_id: Some(provider),
            order_id: None,
            title: "Odbiór tłumaczeń".to_string(),
            location: Some("Biuro".to_string()),
            starts_at: at(from),
            ends_at: at(to),
            note: None,
        }
    }

    #[test]
    fn end_must_follow_start() {
        let err = Appointment::new(AppointmentId::new(), input(PersonId::new(), 10, 10), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn back_to_back_does_not_clash() {
        let provider = PersonId::new();
        let a = Appointment::new(AppointmentId::new(), input(provider, 9, 10), Utc::now()).unwrap();
        let all = [a];
        let cal = Calendar::new(all.iter());
        assert!(cal.clashes(provider, at(10), at(11), None).is_empty());
        assert_eq!(cal.clashes(provider, at(9), at(11), None).len(), 1);
        assert!(cal.clashes(PersonId::new(), at(9), at(11), None).is_empty());
    }

    #[test]
    fn cancelled_appointments_free_the_slot() {
        let provider = PersonId::new();
        let mut a = Appointment::new(AppointmentId::new(), input(provider, 9, 10), Utc::now()).unwrap();
        a.cancel(Utc::now()).unwrap();
        let all = [a];
        let cal = Calendar::new(all.iter());
        assert!(cal.clashes(provider, at(9), at(10), None).is_empty());
        assert!(all[0].clone().complete(Utc::now()).is_err());
    }

    #[test]
    fn between_orders_by_start() {
        let provider = PersonId::new();
        let late = Appointment::new(AppointmentId::new(), input(provider, 15, 16), Utc::now()).unwrap();
        let early = Appointment::new(AppointmentId::new(), input(provider, 8, 9), Utc::now()).unwrap();
        let all = [late, early];
        let cal = Calendar::new(all.iter());
        let day = cal.between(at(0), at(0) + Duration::days(1));
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].starts_at(), at(8));
    }
}
