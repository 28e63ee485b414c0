// SPDX-FileCopyrightText: 2026 PQRS Desk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted record gateway for deterministic orchestrator and desk tests.
//!
//! `ScriptedGateway` stores records per layout in memory, logs every call in
//! order, and fails calls that match a queued [`Fault`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use pqrs_core::{CreatedRecord, FieldMap, PqrsError, RawRecord, RecordGateway, ScriptOutcome, Upload};
use serde_json::Value;

/// Gateway operation kinds, for fault injection and call filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Get,
    Find,
    Create,
    Update,
    Upload,
    Script,
}

/// A failure to return instead of performing the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `SessionExpired`, or `AuthExpiredDuringWrite` for creates.
    AuthExpired,
    Rejected,
    NotFound,
    Transport,
}

impl Fault {
    fn error(self, op: Op) -> PqrsError {
        match self {
            Self::AuthExpired if op == Op::Create => PqrsError::AuthExpiredDuringWrite,
            Self::AuthExpired => PqrsError::SessionExpired,
            Self::Rejected => PqrsError::rejected(format!("scripted {op:?} rejection")),
            Self::NotFound => PqrsError::NotFound("scripted missing record".into()),
            Self::Transport => PqrsError::Http {
                message: "scripted connection reset".into(),
                source: None,
            },
        }
    }
}

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    List {
        layout: String,
        limit: u32,
    },
    Get {
        layout: String,
        record_id: String,
    },
    Find {
        layout: String,
        query: Vec<FieldMap>,
    },
    Create {
        layout: String,
        fields: FieldMap,
    },
    Update {
        layout: String,
        record_id: String,
        fields: FieldMap,
    },
    Upload {
        layout: String,
        record_id: String,
        field: String,
        file: String,
    },
    Script {
        layout: String,
        script: String,
        param: Option<String>,
    },
}

impl GatewayCall {
    pub fn op(&self) -> Op {
        match self {
            Self::List { .. } => Op::List,
            Self::Get { .. } => Op::Get,
            Self::Find { .. } => Op::Find,
            Self::Create { .. } => Op::Create,
            Self::Update { .. } => Op::Update,
            Self::Upload { .. } => Op::Upload,
            Self::Script { .. } => Op::Script,
        }
    }

    pub fn layout(&self) -> &str {
        match self {
            Self::List { layout, .. }
            | Self::Get { layout, .. }
            | Self::Find { layout, .. }
            | Self::Create { layout, .. }
            | Self::Update { layout, .. }
            | Self::Upload { layout, .. }
            | Self::Script { layout, .. } => layout,
        }
    }
}

#[derive(Default)]
struct State {
    records: HashMap<String, Vec<RawRecord>>,
    next_id: u64,
    calls: Vec<GatewayCall>,
    faults: HashMap<(Op, String), VecDeque<Fault>>,
    failing_uploads: HashSet<usize>,
    uploads_attempted: usize,
}

/// In-memory gateway with call recording and fault injection.
pub struct ScriptedGateway {
    state: Mutex<State>,
    invalidations: AtomicUsize,
}

impl ScriptedGateway {
    /// Empty gateway; created records get ids from 1000 upwards.
    pub fn new() -> Self {
        Self::starting_at(1000)
    }

    pub fn starting_at(first_id: u64) -> Self {
        Self {
            state: Mutex::new(State {
                next_id: first_id,
                ..State::default()
            }),
            invalidations: AtomicUsize::new(0),
        }
    }

    /// Seeds a record. `fields` must be a JSON object.
    pub fn with_record(self, layout: &str, record_id: &str, fields: Value) -> Self {
        let field_data = match fields {
            Value::Object(map) => map,
            _ => FieldMap::new(),
        };
        self.state()
            .records
            .entry(layout.to_string())
            .or_default()
            .push(RawRecord {
                record_id: record_id.to_string(),
                mod_id: "0".to_string(),
                field_data,
                portal_data: Default::default(),
            });
        self
    }

    /// Fails the next `times` calls of `op` on `layout` with `fault`.
    pub fn fail(&self, op: Op, layout: &str, times: usize, fault: Fault) {
        self.state()
            .faults
            .entry((op, layout.to_string()))
            .or_default()
            .extend(std::iter::repeat_n(fault, times));
    }

    /// Rejects the `nth` container upload (1-based, counted across layouts).
    pub fn fail_nth_upload(&self, nth: usize) {
        self.state().failing_uploads.insert(nth);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    pub fn calls_to(&self, op: Op) -> Vec<GatewayCall> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .cloned()
            .collect()
    }

    /// Field maps of every create call on `layout`, including failed ones.
    pub fn creates_on(&self, layout: &str) -> Vec<FieldMap> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                GatewayCall::Create { layout: l, fields } if l == layout => Some(fields.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn records(&self, layout: &str) -> Vec<RawRecord> {
        self.state().records.get(layout).cloned().unwrap_or_default()
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the call, then returns the queued fault for it, if any.
    fn begin(&self, call: GatewayCall) -> Result<(), PqrsError> {
        let mut state = self.state();
        let op = call.op();
        let key = (op, call.layout().to_string());
        state.calls.push(call);

        if op == Op::Upload {
            state.uploads_attempted += 1;
            let nth = state.uploads_attempted;
            if state.failing_uploads.contains(&nth) {
                return Err(Fault::Rejected.error(op));
            }
        }

        match state.faults.get_mut(&key).and_then(VecDeque::pop_front) {
            Some(fault) => Err(fault.error(op)),
            None => Ok(()),
        }
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordGateway for ScriptedGateway {
    async fn list(&self, layout: &str, limit: u32) -> Result<Vec<RawRecord>, PqrsError> {
        self.begin(GatewayCall::List {
            layout: layout.to_string(),
            limit,
        })?;
        let mut records = self.records(layout);
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn get(&self, layout: &str, record_id: &str) -> Result<RawRecord, PqrsError> {
        self.begin(GatewayCall::Get {
            layout: layout.to_string(),
            record_id: record_id.to_string(),
        })?;
        self.records(layout)
            .into_iter()
            .find(|r| r.record_id == record_id)
            .ok_or_else(|| PqrsError::NotFound(format!("record {record_id} not found")))
    }

    async fn find(
        &self,
        layout: &str,
        query: Vec<FieldMap>,
        limit: Option<u32>,
    ) -> Result<Vec<RawRecord>, PqrsError> {
        self.begin(GatewayCall::Find {
            layout: layout.to_string(),
            query: query.clone(),
        })?;
        let mut found: Vec<RawRecord> = self
            .records(layout)
            .into_iter()
            .filter(|r| query.iter().any(|request| matches_request(r, request)))
            .collect();
        if let Some(limit) = limit {
            found.truncate(limit as usize);
        }
        Ok(found)
    }

    async fn create(&self, layout: &str, fields: FieldMap) -> Result<CreatedRecord, PqrsError> {
        self.begin(GatewayCall::Create {
            layout: layout.to_string(),
            fields: fields.clone(),
        })?;
        let mut state = self.state();
        let record_id = state.next_id.to_string();
        state.next_id += 1;
        state
            .records
            .entry(layout.to_string())
            .or_default()
            .push(RawRecord {
                record_id: record_id.clone(),
                mod_id: "0".to_string(),
                field_data: fields,
                portal_data: Default::default(),
            });
        Ok(CreatedRecord {
            record_id,
            mod_id: Some("0".to_string()),
        })
    }

    async fn update(
        &self,
        layout: &str,
        record_id: &str,
        fields: FieldMap,
    ) -> Result<String, PqrsError> {
        self.begin(GatewayCall::Update {
            layout: layout.to_string(),
            record_id: record_id.to_string(),
            fields: fields.clone(),
        })?;
        let mut state = self.state();
        let record = state
            .records
            .get_mut(layout)
            .and_then(|records| records.iter_mut().find(|r| r.record_id == record_id))
            .ok_or_else(|| PqrsError::NotFound(format!("record {record_id} not found")))?;
        record.field_data.extend(fields);
        let next = record.mod_id.parse::<u64>().unwrap_or(0) + 1;
        record.mod_id = next.to_string();
        Ok(record.mod_id.clone())
    }

    async fn upload_container(
        &self,
        layout: &str,
        record_id: &str,
        field: &str,
        file: &Upload,
    ) -> Result<(), PqrsError> {
        self.begin(GatewayCall::Upload {
            layout: layout.to_string(),
            record_id: record_id.to_string(),
            field: field.to_string(),
            file: file.name.clone(),
        })?;
        if self.records(layout).iter().any(|r| r.record_id == record_id) {
            Ok(())
        } else {
            Err(PqrsError::NotFound(format!("record {record_id} not found")))
        }
    }

    async fn run_script(
        &self,
        layout: &str,
        script: &str,
        param: Option<&str>,
    ) -> Result<ScriptOutcome, PqrsError> {
        self.begin(GatewayCall::Script {
            layout: layout.to_string(),
            script: script.to_string(),
            param: param.map(str::to_string),
        })?;
        Ok(ScriptOutcome {
            error_code: Some("0".to_string()),
            result: None,
        })
    }

    fn invalidate_session(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

/// FileMaker find semantics: `==value` matches exactly, a bare value matches
/// any field that begins with it.
fn matches_request(record: &RawRecord, request: &FieldMap) -> bool {
    request.iter().all(|(key, wanted)| {
        let wanted = text(wanted);
        record.field_data.get(key).is_some_and(|actual| {
            let actual = text(actual);
            match wanted.strip_prefix("==") {
                Some(exact) => actual == exact,
                None => actual.starts_with(&wanted),
            }
        })
    })
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            _ => FieldMap::new(),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_records_calls() {
        let gateway = ScriptedGateway::starting_at(7);
        let first = gateway.create("PQRS", fields(json!({"a": 1}))).await.unwrap();
        let second = gateway.create("PQRS", fields(json!({"a": 2}))).await.unwrap();
        assert_eq!(first.record_id, "7");
        assert_eq!(second.record_id, "8");
        assert_eq!(gateway.creates_on("PQRS").len(), 2);
        assert_eq!(gateway.records("PQRS").len(), 2);
    }

    #[tokio::test]
    async fn queued_faults_are_consumed_in_order() {
        let gateway = ScriptedGateway::new();
        gateway.fail(Op::Create, "PQRS", 1, Fault::AuthExpired);
        assert!(matches!(
            gateway.create("PQRS", FieldMap::new()).await,
            Err(PqrsError::AuthExpiredDuringWrite)
        ));
        assert!(gateway.create("PQRS", FieldMap::new()).await.is_ok());
        assert_eq!(gateway.calls_to(Op::Create).len(), 2);
    }

    #[tokio::test]
    async fn find_matches_numbers_as_text() {
        let gateway = ScriptedGateway::new()
            .with_record("Bitacora", "1", json!({"fk_PQRS": 12}))
            .with_record("Bitacora", "2", json!({"fk_PQRS": "13"}));
        let found = gateway
            .find("Bitacora", vec![fields(json!({"fk_PQRS": "12"}))], None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].record_id, "1");
    }

    #[tokio::test]
    async fn bare_find_values_match_by_prefix() {
        let gateway = ScriptedGateway::new()
            .with_record("Bitacora", "1", json!({"fk_PQRS": "12"}))
            .with_record("Bitacora", "2", json!({"fk_PQRS": "120"}));
        let loose = gateway
            .find("Bitacora", vec![fields(json!({"fk_PQRS": "12"}))], None)
            .await
            .unwrap();
        assert_eq!(loose.len(), 2);

        let exact = gateway
            .find("Bitacora", vec![fields(json!({"fk_PQRS": "==12"}))], None)
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].record_id, "1");
    }

    #[tokio::test]
    async fn nth_upload_fails() {
        let gateway = ScriptedGateway::new().with_record("Bitacora", "1", json!({}));
        gateway.fail_nth_upload(2);
        let file = Upload::new("a.pdf", vec![1]);
        assert!(gateway.upload_container("Bitacora", "1", "Adjunto", &file).await.is_ok());
        assert!(gateway.upload_container("Bitacora", "1", "Adjunto", &file).await.is_err());
        assert!(gateway.upload_container("Bitacora", "1", "Adjunto", &file).await.is_ok());
    }

    #[tokio::test]
    async fn update_bumps_mod_id() {
        let gateway = ScriptedGateway::new().with_record("PQRS", "5", json!({"Estado": "Pendiente"}));
        let mod_id = gateway
            .update("PQRS", "5", fields(json!({"Estado": "Cerrada"})))
            .await
            .unwrap();
        assert_eq!(mod_id, "1");
        assert_eq!(gateway.records("PQRS")[0].field_data["Estado"], "Cerrada");
        assert!(matches!(
            gateway.update("PQRS", "6", FieldMap::new()).await,
            Err(PqrsError::NotFound(_))
        ));
    }
}
