mod batch_properties;
mod legacy_payloads;
