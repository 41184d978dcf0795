use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fmt::Display;

use regex::Regex;
use rust_decimal::Decimal;

use super::error::ModelError;
use super::prices::Prices;

/// Number of decimal places kept by [`Accounts::value`].
pub const VALUE_PRECISION: u32 = 12;

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub struct AccountId(usize);

impl Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    segment: String,
    parent: Option<AccountId>,
    children: BTreeMap<String, AccountId>,
    balances: BTreeMap<String, Decimal>,
}

impl Node {
    fn new(segment: &str, parent: Option<AccountId>) -> Self {
        Node {
            segment: segment.to_string(),
            parent,
            children: BTreeMap::new(),
            balances: BTreeMap::new(),
        }
    }
}

/// The account tree. Nodes live in an arena addressed by [`AccountId`]; the
/// root has no name and no parent and also owns the market prices.
#[derive(Debug, Clone, PartialEq)]
pub struct Accounts {
    nodes: Vec<Node>,
    prices: Prices,
}

impl Default for Accounts {
    fn default() -> Self {
        Self::new()
    }
}

impl Accounts {
    pub const ROOT: AccountId = AccountId(0);

    pub fn new() -> Self {
        Accounts {
            nodes: vec![Node::new("", None)],
            prices: Prices::default(),
        }
    }

    pub fn root(&self) -> AccountId {
        Self::ROOT
    }

    /// Walks `path` from `from`, creating every missing segment.
    pub fn get_or_create(&mut self, from: AccountId, path: &str) -> AccountId {
        let mut current = from;
        for segment in path.split(':') {
            current = match self.nodes[current.0].children.get(segment) {
                Some(child) => *child,
                None => {
                    let child = AccountId(self.nodes.len());
                    self.nodes.push(Node::new(segment, Some(current)));
                    self.nodes[current.0]
                        .children
                        .insert(segment.to_string(), child);
                    child
                }
            };
        }
        current
    }

    pub fn account(&mut self, path: &str) -> AccountId {
        self.get_or_create(Self::ROOT, path)
    }

    /// Looks up `path` from the root without creating anything.
    pub fn get(&self, path: &str) -> Option<AccountId> {
        path.split(':').try_fold(Self::ROOT, |current, segment| {
            self.nodes[current.0].children.get(segment).copied()
        })
    }

    pub fn segment(&self, id: AccountId) -> &str {
        &self.nodes[id.0].segment
    }

    pub fn parent(&self, id: AccountId) -> Option<AccountId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: AccountId) -> impl Iterator<Item = AccountId> + '_ {
        self.nodes[id.0].children.values().copied()
    }

    /// All accounts below `id` in pre-order, children sorted by name.
    pub fn descendants(&self, id: AccountId) -> Vec<AccountId> {
        let mut res = Vec::new();
        let mut todo: Vec<AccountId> = self.children(id).collect();
        todo.reverse();
        while let Some(a) = todo.pop() {
            res.push(a);
            todo.extend(self.nodes[a.0].children.values().rev().copied());
        }
        res
    }

    /// The colon-joined path from the root.
    pub fn name(&self, id: AccountId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(a) = current {
            let node = &self.nodes[a.0];
            if node.parent.is_some() {
                segments.push(node.segment.as_str());
            }
            current = node.parent;
        }
        segments.reverse();
        segments.join(":")
    }

    /// Number of `:` in the account's name; the root and top level accounts
    /// are both 0.
    pub fn depth(&self, id: AccountId) -> usize {
        let mut depth: usize = 0;
        let mut current = self.parent(id);
        while let Some(a) = current {
            depth += 1;
            current = self.parent(a);
        }
        depth.saturating_sub(1)
    }

    pub fn add_value(
        &mut self,
        id: AccountId,
        currency: &str,
        delta: Decimal,
        init: bool,
    ) -> Result<(), ModelError> {
        if delta.is_zero() {
            return Ok(());
        }
        let balance = match init {
            true => delta,
            false => self
                .specific_value(id, currency)
                .checked_add(delta)
                .ok_or_else(|| ModelError::overflow(format!("{} {}{}", self.name(id), currency, delta)))?,
        };
        self.nodes[id.0].balances.insert(currency.to_string(), balance);
        Ok(())
    }

    fn total(&self, id: AccountId, currency: &str) -> Result<Decimal, ModelError> {
        let node = &self.nodes[id.0];
        let own = node.balances.get(currency).copied().unwrap_or_default();
        node.children.values().try_fold(own, |sum, c| {
            sum.checked_add(self.total(*c, currency)?)
                .ok_or_else(|| ModelError::overflow(format!("balance of {} {}", self.name(id), currency)))
        })
    }

    /// Own balance plus all descendants' balances.
    pub fn value(&self, id: AccountId, currency: &str) -> Result<Decimal, ModelError> {
        Ok(self.total(id, currency)?.round_dp(VALUE_PRECISION))
    }

    pub fn specific_value(&self, id: AccountId, currency: &str) -> Decimal {
        self.nodes[id.0]
            .balances
            .get(currency)
            .copied()
            .unwrap_or_default()
    }

    pub fn currencies(&self, id: AccountId) -> BTreeSet<String> {
        let node = &self.nodes[id.0];
        let mut res: BTreeSet<String> = node.balances.keys().cloned().collect();
        for child in node.children.values() {
            res.extend(self.currencies(*child));
        }
        res
    }

    /// True if `patterns` is empty or any of them matches the account name
    /// at its start.
    pub fn matches(&self, id: AccountId, patterns: &[Regex]) -> bool {
        if patterns.is_empty() {
            return true;
        }
        let name = self.name(id);
        patterns
            .iter()
            .any(|p| p.find(&name).is_some_and(|m| m.start() == 0))
    }

    pub fn prices(&self) -> &Prices {
        &self.prices
    }

    pub fn set_market_price(&mut self, commodity: &str, target: &str, rate: Decimal) {
        self.prices.insert(commodity, target, rate)
    }

    pub fn market_price(&self, commodity: &str, target: &str) -> Result<Decimal, ModelError> {
        self.prices.rate(commodity, target)
    }
}
