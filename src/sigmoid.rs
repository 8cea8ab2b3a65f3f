//! Precomputed sigmoid lookup table over a bounded domain.

pub struct SigmoidTable {
    table: Vec<f32>,
    domain: f32,
    size: u32,
}

impl SigmoidTable {
    pub fn build(size: u32, domain: f32) -> Self {
        let table = (0..size)
            .map(|i| {
                let x = (i as f32 / size as f32 * 2.0 - 1.0) * domain;
                let e = x.exp();
                e / (e + 1.0)
            })
            .collect();
        SigmoidTable { table, domain, size }
    }

    /// `f` must already be known to lie within `[-domain, +domain]`; callers
    /// handle out-of-domain values themselves (clamp for negative sampling,
    /// skip for hierarchical softmax).
    pub fn lookup(&self, f: f32) -> f32 {
        let idx = ((f + self.domain) * (self.size as f32 / (2.0 * self.domain))) as usize;
        self.table[idx.min(self.table.len() - 1)]
    }

    pub fn domain(&self) -> f32 {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_sigmoid_at_sampled_points() {
        let table = SigmoidTable::build(1000, 6.0);
        for &x in &[-6.0f32, 0.0, 6.0 - 1e-3] {
            let expected = x.exp() / (x.exp() + 1.0);
            let got = table.lookup(x);
            assert!((got - expected).abs() < 0.05, "x={x} got={got} expected={expected}");
        }
    }
}
