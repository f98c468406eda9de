//! All records of the office in one cloneable value.

use serde::{Deserialize, Serialize};

use brokerdesk_catalog::{Service, Status};
use brokerdesk_core::{
    AppointmentId, InvoiceElementId, InvoiceId, OfferId, OrderElementId, OrderId, PaymentId,
    PersonId, ProformaId, ReceiptId, ServiceId, StatusId,
};
use brokerdesk_documents::{
    Invoice, InvoiceElement, Offer, Order, OrderElement, Payment, Proforma, Receipt, SerialBook,
};
use brokerdesk_parties::Person;
use brokerdesk_scheduling::Appointment;

use crate::error::{OfficeError, OfficeResult};
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Books {
    pub persons: Table<PersonId, Person>,
    pub statuses: Table<StatusId, Status>,
    pub services: Table<ServiceId, Service>,
    pub offers: Table<OfferId, Offer>,
    pub orders: Table<OrderId, Order>,
    pub proformas: Table<ProformaId, Proforma>,
    pub invoices: Table<InvoiceId, Invoice>,
    pub payments: Table<PaymentId, Payment>,
    pub receipts: Table<ReceiptId, Receipt>,
    pub appointments: Table<AppointmentId, Appointment>,
    pub serials: SerialBook,
}

impl Books {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn person(&self, id: PersonId) -> OfficeResult<&Person> {
        self.persons.require(&id, "person")
    }

    pub fn order(&self, id: OrderId) -> OfficeResult<&Order> {
        self.orders.require(&id, "order")
    }

    pub fn order_mut(&mut self, id: OrderId) -> OfficeResult<&mut Order> {
        self.orders.require_mut(&id, "order")
    }

    pub fn order_element(
        &self,
        order_id: OrderId,
        element_id: OrderElementId,
    ) -> OfficeResult<&OrderElement> {
        self.order(order_id)?
            .element(element_id)
            .ok_or_else(|| OfficeError::not_found("order element", element_id))
    }

    pub fn invoice(&self, id: InvoiceId) -> OfficeResult<&Invoice> {
        self.invoices.require(&id, "invoice")
    }

    pub fn invoice_mut(&mut self, id: InvoiceId) -> OfficeResult<&mut Invoice> {
        self.invoices.require_mut(&id, "invoice")
    }

    pub fn invoice_element(
        &self,
        invoice_id: InvoiceId,
        element_id: InvoiceElementId,
    ) -> OfficeResult<&InvoiceElement> {
        self.invoice(invoice_id)?
            .element(element_id)
            .ok_or_else(|| OfficeError::not_found("invoice element", element_id))
    }

    pub fn payment(&self, id: PaymentId) -> OfficeResult<&Payment> {
        self.payments.require(&id, "payment")
    }

    pub fn person_name(&self, id: PersonId) -> &str {
        self.persons.get(&id).map(Person::name).unwrap_or("?")
    }

    /// Receipt issued for a payment, if any.
    pub fn receipt_for(&self, payment_id: PaymentId) -> Option<&Receipt> {
        self.receipts.values().find(|r| r.payment_id() == payment_id)
    }
}
