//! String array with indirected lookups
//!
//! String literals are collected into one array returned by a hoisted
//! function at the top of the script, so lookups work even from code that
//! runs before the declaration is reached. Each literal is replaced by a call to an accessor that subtracts a
//! fixed offset from its argument; with the calls transform, references go
//! through wrapper functions that subtract a further shift before delegating
//! to the accessor.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

/// Distinct string literals in first-seen order
#[derive(Debug, Default)]
pub struct StringPool {
    literals: Vec<String>,
    index: HashMap<String, usize>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `raw` (the literal including its quotes), adding it if new
    pub fn intern(&mut self, raw: &str) -> usize {
        if let Some(&i) = self.index.get(raw) {
            return i;
        }
        let i = self.literals.len();
        self.literals.push(raw.to_string());
        self.index.insert(raw.to_string(), i);
        i
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

/// A function routing lookups to the accessor
#[derive(Debug, Clone)]
struct Wrapper {
    name: String,
    shift: usize,
}

/// Rendered form of a [`StringPool`]
#[derive(Debug)]
pub struct StringArray {
    array_name: String,
    accessor_name: String,
    offset: usize,
    /// Array literals in their shuffled order
    literals: Vec<String>,
    /// Pool index -> position in `literals`
    positions: Vec<usize>,
    wrappers: Vec<Wrapper>,
}

impl StringArray {
    /// Shuffle the pool and draw offsets
    ///
    /// `names` yields fresh identifiers: array, accessor, then one per wrapper.
    pub fn build<R, F>(pool: StringPool, wrapper_count: usize, rng: &mut R, mut names: F) -> Self
    where
        R: Rng,
        F: FnMut(&mut R) -> String,
    {
        let mut order: Vec<usize> = (0..pool.len()).collect();
        order.shuffle(rng);

        let mut positions = vec![0; pool.len()];
        for (position, &pool_index) in order.iter().enumerate() {
            positions[pool_index] = position;
        }
        let literals = order.iter().map(|&i| pool.literals[i].clone()).collect();

        let array_name = names(rng);
        let accessor_name = names(rng);
        let offset = rng.gen_range(0x100..0x400);
        let wrappers = (0..wrapper_count)
            .map(|_| {
                let name = names(rng);
                Wrapper {
                    name,
                    shift: rng.gen_range(0x10..0x1000),
                }
            })
            .collect();

        Self {
            array_name,
            accessor_name,
            offset,
            literals,
            positions,
            wrappers,
        }
    }

    /// Declarations placed before the script body
    pub fn prelude(&self) -> String {
        let mut out = format!(
            "function {0}(){{var a=[{1}];{0}=function(){{return a;}};return a;}}",
            self.array_name,
            self.literals.join(",")
        );
        out.push_str(&format!(
            "function {}(i){{return {}()[i-{:#x}];}}",
            self.accessor_name, self.array_name, self.offset
        ));
        for wrapper in &self.wrappers {
            out.push_str(&format!(
                "function {}(i){{return {}(i-{:#x});}}",
                wrapper.name, self.accessor_name, wrapper.shift
            ));
        }
        out
    }

    /// Expression yielding the literal with the given pool index
    pub fn reference<R: Rng>(&self, pool_index: usize, rng: &mut R) -> String {
        let index = self.positions[pool_index] + self.offset;
        match self.wrappers.choose(rng) {
            Some(wrapper) => format!("{}({:#x})", wrapper.name, index + wrapper.shift),
            None => format!("{}({:#x})", self.accessor_name, index),
        }
    }
}
