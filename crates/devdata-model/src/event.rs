//! The polymorphic device event and its JSON shape.
//!
//! Every record shares a header (`id`, `type`, `time`, `timezoneOffset`,
//! `deviceTime`); the remaining fields decode into a typed payload chosen by
//! `type`. Unrecognised types keep all of their fields verbatim, and typed
//! payloads keep unrecognised fields in their `extra` maps.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::basal::BasalSegment;
use crate::bolus::BolusDose;
use crate::device_time;
use crate::enums::EventType;
use crate::error::{ModelError, Result};
use crate::glucose::GlucoseReading;
use crate::ids::EventId;
use crate::wizard::WizardRecord;

/// One telemetry record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEvent")]
pub struct DeviceEvent {
    pub id: EventId,
    /// Absolute instant of the event.
    pub time: Option<DateTime<Utc>>,
    /// Minutes to add to `time` to obtain device-local time.
    pub timezone_offset: Option<i32>,
    /// Device-local wall-clock time, derived from `time`.
    pub device_time: Option<NaiveDateTime>,
    pub payload: EventPayload,
}

/// Type-specific part of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Cbg(GlucoseReading),
    Smbg(GlucoseReading),
    Basal(BasalSegment),
    Bolus(BolusDose),
    Wizard(WizardRecord),
    /// A type this crate does not model, carried through untouched.
    Other(OtherRecord),
}

/// Fields of a record whose `type` is not modelled.
#[derive(Debug, Clone, PartialEq)]
pub struct OtherRecord {
    pub kind: String,
    pub fields: Map<String, Value>,
}

impl EventPayload {
    /// The modelled event type, or None for [`EventPayload::Other`].
    pub fn event_type(&self) -> Option<EventType> {
        match self {
            EventPayload::Cbg(_) => Some(EventType::Cbg),
            EventPayload::Smbg(_) => Some(EventType::Smbg),
            EventPayload::Basal(_) => Some(EventType::Basal),
            EventPayload::Bolus(_) => Some(EventType::Bolus),
            EventPayload::Wizard(_) => Some(EventType::Wizard),
            EventPayload::Other(_) => None,
        }
    }

    /// The `type` string as it appears on the wire.
    pub fn kind_name(&self) -> &str {
        match self {
            EventPayload::Other(other) => &other.kind,
            _ => self.event_type().map_or("", |kind| kind.as_str()),
        }
    }
}

impl DeviceEvent {
    pub fn new(id: EventId, payload: EventPayload) -> Self {
        Self {
            id,
            time: None,
            timezone_offset: None,
            device_time: None,
            payload,
        }
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_timezone_offset(mut self, minutes: i32) -> Self {
        self.timezone_offset = Some(minutes);
        self
    }

    pub fn event_type(&self) -> Option<EventType> {
        self.payload.event_type()
    }

    pub fn kind_name(&self) -> &str {
        self.payload.kind_name()
    }

    /// Instant used to place the record on the timeline: `time`, or the
    /// recorded `start` of a basal segment that has no `time`.
    pub fn timeline_instant(&self) -> Option<DateTime<Utc>> {
        self.time
            .or_else(|| self.as_basal().and_then(|segment| segment.start))
    }

    pub fn as_glucose(&self) -> Option<&GlucoseReading> {
        match &self.payload {
            EventPayload::Cbg(reading) | EventPayload::Smbg(reading) => Some(reading),
            _ => None,
        }
    }

    pub fn as_glucose_mut(&mut self) -> Option<&mut GlucoseReading> {
        match &mut self.payload {
            EventPayload::Cbg(reading) | EventPayload::Smbg(reading) => Some(reading),
            _ => None,
        }
    }

    pub fn as_basal(&self) -> Option<&BasalSegment> {
        match &self.payload {
            EventPayload::Basal(segment) => Some(segment),
            _ => None,
        }
    }

    pub fn as_basal_mut(&mut self) -> Option<&mut BasalSegment> {
        match &mut self.payload {
            EventPayload::Basal(segment) => Some(segment),
            _ => None,
        }
    }

    pub fn as_bolus(&self) -> Option<&BolusDose> {
        match &self.payload {
            EventPayload::Bolus(dose) => Some(dose),
            _ => None,
        }
    }

    pub fn as_bolus_mut(&mut self) -> Option<&mut BolusDose> {
        match &mut self.payload {
            EventPayload::Bolus(dose) => Some(dose),
            _ => None,
        }
    }

    pub fn as_wizard(&self) -> Option<&WizardRecord> {
        match &self.payload {
            EventPayload::Wizard(record) => Some(record),
            _ => None,
        }
    }

    /// Decodes a raw JSON record.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Encodes back to the JSON shape consumed downstream.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

const DEVICE_TIME_KEY: &str = "deviceTime";

/// Header fields split from the payload on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    id: EventId,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    time: Option<DateTime<Utc>>,
    #[serde(default)]
    timezone_offset: Option<i32>,
    #[serde(default)]
    device_time: Option<Value>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl TryFrom<RawEvent> for DeviceEvent {
    type Error = ModelError;

    fn try_from(raw: RawEvent) -> Result<Self> {
        let RawEvent {
            id,
            kind,
            time,
            timezone_offset,
            device_time,
            mut fields,
        } = raw;
        // Only the naive form is carried in the header. Anything else is dropped
        // for modelled types, which get a fresh value from the time stage, and
        // kept verbatim on records of unknown type.
        let (device_time, unparsed) = match device_time {
            None | Some(Value::Null) => (None, None),
            Some(Value::String(raw)) => match device_time::parse_device_time(&raw) {
                Some(parsed) => (Some(parsed), None),
                None => (None, Some(Value::String(raw))),
            },
            Some(other) => (None, Some(other)),
        };
        let payload = match kind.parse::<EventType>() {
            Ok(EventType::Cbg) => EventPayload::Cbg(decode_payload(EventType::Cbg, fields)?),
            Ok(EventType::Smbg) => EventPayload::Smbg(decode_payload(EventType::Smbg, fields)?),
            Ok(EventType::Basal) => EventPayload::Basal(decode_payload(EventType::Basal, fields)?),
            Ok(EventType::Bolus) => EventPayload::Bolus(decode_payload(EventType::Bolus, fields)?),
            Ok(EventType::Wizard) => {
                EventPayload::Wizard(decode_payload(EventType::Wizard, fields)?)
            }
            Err(_) => {
                if let Some(raw) = unparsed {
                    fields.insert(DEVICE_TIME_KEY.to_string(), raw);
                }
                EventPayload::Other(OtherRecord { kind, fields })
            }
        };
        Ok(Self {
            id,
            time,
            timezone_offset,
            device_time,
            payload,
        })
    }
}

fn decode_payload<T: DeserializeOwned>(kind: EventType, fields: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(fields)).map_err(|source| ModelError::InvalidPayload {
        kind: kind.as_str(),
        source,
    })
}

#[derive(Serialize)]
#[serde(untagged)]
enum PayloadFields<'a> {
    Glucose(&'a GlucoseReading),
    Basal(&'a BasalSegment),
    Bolus(&'a BolusDose),
    Wizard(&'a WizardRecord),
    Other(OtherFields<'a>),
}

/// Fields of an unknown-type record. A `deviceTime` kept from the input
/// yields to the header value once one has been derived.
struct OtherFields<'a> {
    fields: &'a Map<String, Value>,
    header_device_time: bool,
}

impl Serialize for OtherFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.fields
                .iter()
                .filter(|(key, _)| !(self.header_device_time && key.as_str() == DEVICE_TIME_KEY)),
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent<'a> {
    id: &'a EventId,
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone_offset: Option<i32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "device_time::serialize_option"
    )]
    device_time: Option<NaiveDateTime>,
    #[serde(flatten)]
    fields: PayloadFields<'a>,
}

impl Serialize for DeviceEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let fields = match &self.payload {
            EventPayload::Cbg(reading) | EventPayload::Smbg(reading) => {
                PayloadFields::Glucose(reading)
            }
            EventPayload::Basal(segment) => PayloadFields::Basal(segment),
            EventPayload::Bolus(dose) => PayloadFields::Bolus(dose),
            EventPayload::Wizard(record) => PayloadFields::Wizard(record),
            EventPayload::Other(other) => PayloadFields::Other(OtherFields {
                fields: &other.fields,
                header_device_time: self.device_time.is_some(),
            }),
        };
        WireEvent {
            id: &self.id,
            kind: self.kind_name(),
            time: self.time,
            timezone_offset: self.timezone_offset,
            device_time: self.device_time,
            fields,
        }
        .serialize(serializer)
    }
}
