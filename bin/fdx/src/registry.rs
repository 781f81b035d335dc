/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2025 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tracing::{debug, info};

use fhedex::{
    eth::{Signer, U256},
    util::parse::{parse_bool, parse_int24, parse_u128, parse_u8, parse_uint},
    Error, Result,
};

use crate::{report::TaskOutput, tasks, Fdx};

/// Declaration of a single `name=value` task parameter
#[derive(Copy, Clone, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Parameters without a default are required
    pub default: Option<&'static str>,
}

impl ParamSpec {
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self { name, description, default: None }
    }

    pub const fn optional(
        name: &'static str,
        description: &'static str,
        default: &'static str,
    ) -> Self {
        Self { name, description, default: Some(default) }
    }
}

/// Parsed and defaulted task parameters
#[derive(Clone, Debug, Default)]
pub struct TaskArgs {
    values: HashMap<String, String>,
}

impl TaskArgs {
    /// Parse `name=value` pairs against `specs`. Unknown, repeated or
    /// missing parameters are rejected.
    pub fn parse(specs: &[ParamSpec], raw: &[String]) -> Result<Self> {
        let mut values = HashMap::new();

        for pair in raw {
            let Some((name, value)) = pair.split_once('=') else {
                return Err(Error::InvalidTaskParam(pair.clone(), "expected name=value".into()))
            };

            if !specs.iter().any(|s| s.name == name) {
                return Err(Error::InvalidTaskParam(name.to_string(), "unknown parameter".into()))
            }

            if values.insert(name.to_string(), value.to_string()).is_some() {
                return Err(Error::InvalidTaskParam(
                    name.to_string(),
                    "given more than once".into(),
                ))
            }
        }

        for spec in specs {
            if values.contains_key(spec.name) {
                continue
            }

            match spec.default {
                Some(default) => {
                    values.insert(spec.name.to_string(), default.to_string());
                }
                None => {
                    return Err(Error::InvalidTaskParam(
                        spec.name.to_string(),
                        "missing required parameter".into(),
                    ))
                }
            }
        }

        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Result<&str> {
        match self.values.get(name) {
            Some(v) => Ok(v.as_str()),
            None => Err(Error::InvalidTaskParam(name.to_string(), "not declared".into())),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        parse_bool(name, self.get(name)?)
    }

    pub fn u8(&self, name: &str) -> Result<u8> {
        parse_u8(name, self.get(name)?)
    }

    pub fn u32(&self, name: &str) -> Result<u32> {
        Ok(parse_uint(name, self.get(name)?, 32)?.low_u32())
    }

    pub fn u128(&self, name: &str) -> Result<u128> {
        parse_u128(name, self.get(name)?)
    }

    pub fn u256(&self, name: &str) -> Result<U256> {
        parse_uint(name, self.get(name)?, 256)
    }

    pub fn int24(&self, name: &str) -> Result<i32> {
        parse_int24(name, self.get(name)?)
    }

    /// A value restricted to `choices`
    pub fn choice(&self, name: &str, choices: &[&'static str]) -> Result<&'static str> {
        let value = self.get(name)?;
        match choices.iter().find(|c| **c == value) {
            Some(c) => Ok(*c),
            None => Err(Error::InvalidTaskParam(
                name.to_string(),
                format!("expected one of {}", choices.join(", ")),
            )),
        }
    }
}

/// A named operation runnable through `fdx run`
#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn params(&self) -> &'static [ParamSpec] {
        &[]
    }

    /// Whether the task submits transactions and needs a funded signer
    fn requires_funds(&self) -> bool;

    async fn run(&self, fdx: &Fdx, signer: &Signer, args: &TaskArgs) -> Result<TaskOutput>;
}

/// Explicit table of the tasks available to the dispatcher
#[derive(Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<&'static str, Box<dyn Task>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in task
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        tasks::register_all(&mut registry)?;
        Ok(registry)
    }

    pub fn register(&mut self, task: Box<dyn Task>) -> Result<()> {
        let name = task.name();
        if self.tasks.contains_key(name) {
            return Err(Error::TaskAlreadyRegistered(name.to_string()))
        }
        self.tasks.insert(name, task);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Task> {
        self.tasks.get(name).map(|t| t.as_ref())
    }

    /// Registered tasks, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &dyn Task> {
        self.tasks.values().map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Fdx {
    /// Run a task: parse its parameters, resolve the signer, guard
    /// funding for tasks that need it, then execute the task body.
    pub async fn dispatch(
        &self,
        registry: &TaskRegistry,
        name: &str,
        params: &[String],
        signer_index: usize,
    ) -> Result<TaskOutput> {
        let Some(task) = registry.get(name) else {
            return Err(Error::UnknownTask(name.to_string()))
        };

        let args = TaskArgs::parse(task.params(), params)?;
        debug!(target: "fdx::registry", "Running {name} with {args:?}");

        let signer = self.resolve_signer(signer_index).await?;

        if task.requires_funds() {
            let status = self.ensure_funded(&signer).await?;
            debug!(target: "fdx::registry", "Funding check for {signer:?}: {status:?}");
        }

        let output = task.run(self, &signer, &args).await?;
        info!(target: "fdx::registry", "Task {name} finished");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECS: &[ParamSpec] = &[
        ParamSpec::optional("amount", "Amount", "5"),
        ParamSpec::required("tick-lower", "Tick"),
    ];

    fn raw(pairs: &[&str]) -> Vec<String> {
        pairs.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn defaults_are_applied() {
        let args = TaskArgs::parse(SPECS, &raw(&["tick-lower=-60"])).unwrap();
        assert_eq!(args.u8("amount").unwrap(), 5);
        assert_eq!(args.int24("tick-lower").unwrap(), -60);
    }

    #[test]
    fn bad_parameters_are_rejected() {
        assert!(TaskArgs::parse(SPECS, &raw(&[])).is_err());
        assert!(TaskArgs::parse(SPECS, &raw(&["tick-lower=0", "fee=1"])).is_err());
        assert!(TaskArgs::parse(SPECS, &raw(&["tick-lower=0", "tick-lower=1"])).is_err());
        assert!(TaskArgs::parse(SPECS, &raw(&["tick-lower"])).is_err());
    }

    #[test]
    fn builtin_registry_has_every_task() {
        let registry = TaskRegistry::builtin().unwrap();
        let names: Vec<_> = registry.iter().map(|t| t.name()).collect();
        for name in [
            "add-liquidity",
            "swap",
            "balance-of",
            "mint",
            "wrap",
            "approve-encrypted",
            "get-iceberg-permissions",
            "place-iceberg-order",
            "get-pool-queue",
            "get-exchange-rate",
            "get-pool-state",
            "get-token-balances",
            "mint-encrypted",
        ] {
            assert!(names.contains(&name), "{name} is not registered");
        }
        assert_eq!(registry.len(), 13);
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = TaskRegistry::builtin().unwrap();
        assert!(matches!(
            tasks::register_all(&mut registry),
            Err(Error::TaskAlreadyRegistered(_))
        ));
    }
}
