use {
    crate::{codec, HierarchyResolver, WriteError},
    interleave_core::{Frame, Insn, MethodNode, UnitNode},
    std::collections::HashMap,
};

/// Writes a rewritten unit back to bytes, recomputing stack metadata on the way.
///
/// Units whose format requires frames get full frame computation: wherever two control-flow
/// paths meet, the operand stack types are merged through the [`HierarchyResolver`]. Older
/// formats only get their maximum stack depth recomputed, which needs no type information.
/// Both modes also check the method's structure (known and unique labels, no stack underflow,
/// equal depths at merge points, no path running past the last instruction).
pub struct UnitWriter<'a> {
    resolver: &'a HierarchyResolver,
}

impl<'a> UnitWriter<'a> {
    pub fn new(resolver: &'a HierarchyResolver) -> Self {
        UnitWriter { resolver }
    }

    pub fn write(&self, mut unit: UnitNode) -> Result<Vec<u8>, WriteError> {
        let compute_frames = unit.version.requires_frames();
        for method in &mut unit.methods {
            self.compute(method, compute_frames)?;
        }
        codec::encode(&unit).map_err(WriteError::Encode)
    }

    fn compute(&self, method: &mut MethodNode, compute_frames: bool) -> Result<(), WriteError> {
        let insns = &method.instructions;
        let mut labels = HashMap::new();
        for (index, insn) in insns.iter().enumerate() {
            if let Insn::Label(label) = insn {
                if labels.insert(*label, index).is_some() {
                    return Err(WriteError::DuplicateLabel {
                        method: method.name.clone(),
                        label: *label,
                    });
                }
            }
        }
        let target = |label: &u16| {
            labels
                .get(label)
                .copied()
                .ok_or_else(|| WriteError::UnknownLabel {
                    method: method.name.clone(),
                    label: *label,
                })
        };

        // Stack types on entry to each instruction; `None` until reached.
        let mut entry: Vec<Option<Vec<String>>> = vec![None; insns.len()];
        let mut pending = Vec::new();
        if !insns.is_empty() {
            entry[0] = Some(Vec::new());
            pending.push(0);
        }
        let mut max_depth = 0;
        while let Some(index) = pending.pop() {
            let mut stack = entry[index].clone().unwrap_or_default();
            let insn = &insns[index];
            let (pops, _) = insn.stack_effect();
            if stack.len() < pops {
                return Err(WriteError::StackUnderflow {
                    method: method.name.clone(),
                    index,
                });
            }
            stack.truncate(stack.len() - pops);
            match insn {
                Insn::Load(ty) => stack.push(ty.clone()),
                Insn::Invoke {
                    returns: Some(ty), ..
                } => stack.push(ty.clone()),
                _ => (),
            }
            max_depth = max_depth.max(stack.len());

            let successors = match insn {
                Insn::Return => vec![],
                Insn::Jump(label) => vec![target(label)?],
                Insn::JumpIf(label) => vec![index + 1, target(label)?],
                _ => vec![index + 1],
            };
            if successors.contains(&insns.len()) {
                return Err(WriteError::FallsOffEnd {
                    method: method.name.clone(),
                });
            }
            for successor in successors {
                let merged = match &entry[successor] {
                    None => stack.clone(),
                    Some(existing) if existing.len() != stack.len() => {
                        return Err(WriteError::InconsistentStack {
                            method: method.name.clone(),
                            index: successor,
                            expected: existing.len(),
                            found: stack.len(),
                        });
                    }
                    Some(existing) if !compute_frames => existing.clone(),
                    Some(existing) => self.merge(&method.name, existing, &stack)?,
                };
                if entry[successor].as_ref() != Some(&merged) {
                    entry[successor] = Some(merged);
                    pending.push(successor);
                }
            }
        }

        let max_stack = u16::try_from(max_depth).map_err(|_| WriteError::StackTooDeep {
            method: method.name.clone(),
        })?;
        let frames = if compute_frames {
            insns
                .iter()
                .zip(entry)
                .filter_map(|(insn, stack)| match (insn, stack) {
                    (Insn::Label(label), Some(stack)) => Some(Frame {
                        label: *label,
                        stack,
                    }),
                    _ => None,
                })
                .collect()
        } else {
            Vec::new()
        };
        method.max_stack = max_stack;
        method.frames = frames;
        Ok(())
    }

    fn merge(
        &self,
        method: &str,
        existing: &[String],
        incoming: &[String],
    ) -> Result<Vec<String>, WriteError> {
        existing
            .iter()
            .zip(incoming)
            .map(|(a, b)| {
                if a == b {
                    return Ok(a.clone());
                }
                self.resolver
                    .common_ancestor(a, b)
                    .map_err(|source| WriteError::Resolve {
                        method: method.to_string(),
                        source,
                    })
            })
            .collect()
    }
}
