//! Auto-definition builder: turns transformed records into an emit-ready,
//! definition-interleaved sequence.
//!
//! For each record kind the builder tracks the definition it last wrote. A
//! data record whose layout still matches rides under the existing
//! definition; any difference (field set, sizes, developer fields, or a
//! lost local-id slot) makes the builder emit a fresh definition first.
//! Output stays compact and every data record is guaranteed a matching
//! definition earlier in the stream.

use std::collections::HashMap;

use log::debug;

use crate::codec::data::DataRecord;
use crate::codec::definition::DefinitionRecord;
use crate::codec::stream::{FinalRecord, OpaqueRecord, Record};

/// Number of local-id slots the wire format provides
const LOCAL_SLOTS: usize = 16;

#[derive(Debug, Default)]
pub struct StreamBuilder {
    /// Which global id currently owns each local-id slot
    slots: [Option<u16>; LOCAL_SLOTS],
    /// Last definition written per global id
    last_emitted: HashMap<u16, DefinitionRecord>,
    next_slot: usize,
    out: Vec<FinalRecord>,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, interleaving a definition when the layout requires it
    pub fn add(&mut self, record: Record) {
        match record {
            Record::Data(rec) => self.add_data(rec),
            Record::Opaque(rec) => self.add_opaque(rec),
        }
    }

    fn add_data(&mut self, mut rec: DataRecord) {
        // Invariant check before every encode: a binding that no longer
        // describes the live field set is regenerated, never trusted
        let needed = if rec.definition_matches() {
            rec.definition()
                .cloned()
                .unwrap_or_else(|| DefinitionRecord::derive_from(&rec, 0))
        } else {
            debug!("Regenerating definition for {} (global {})", rec.name, rec.global_id);
            DefinitionRecord::derive_from(&rec, 0)
        };
        let finalized = self.ensure_definition(needed);
        rec.bind_definition(finalized);
        self.out.push(FinalRecord::Data(rec));
    }

    fn add_opaque(&mut self, rec: OpaqueRecord) {
        let finalized = self.ensure_definition(rec.definition.clone());
        self.out.push(FinalRecord::Opaque {
            local_id: finalized.local_id,
            payload: rec.payload,
        });
    }

    /// Make `def`'s layout the active one for its kind, emitting it into the
    /// output when it differs from what a reader would currently have.
    /// Returns the definition with its assigned local id.
    fn ensure_definition(&mut self, mut def: DefinitionRecord) -> DefinitionRecord {
        let global = def.global_id;

        if let Some(prev) = self.last_emitted.get(&global) {
            let owns_slot = self.slots[prev.local_id as usize] == Some(global);
            if owns_slot && prev.same_layout(&def) {
                return prev.clone();
            }
            if owns_slot {
                // Layout changed but the kind still holds its slot
                def.local_id = prev.local_id;
                self.out.push(FinalRecord::Definition(def.clone()));
                self.last_emitted.insert(global, def.clone());
                return def;
            }
        }

        // Allocate the next slot round-robin; the previous owner (if any)
        // will re-emit its definition when it next appears
        let local = self.next_slot as u8;
        self.next_slot = (self.next_slot + 1) % LOCAL_SLOTS;
        if let Some(evicted) = self.slots[local as usize] {
            debug!("Local id {} rebound from global {} to {}", local, evicted, global);
        }
        self.slots[local as usize] = Some(global);
        def.local_id = local;
        self.out.push(FinalRecord::Definition(def.clone()));
        self.last_emitted.insert(global, def.clone());
        def
    }

    /// Consume the builder, yielding the finalized record sequence
    pub fn finish(self) -> Vec<FinalRecord> {
        self.out
    }
}
