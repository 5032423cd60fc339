//! # Probabilidades a partir de Contagens
//!
//! Todas as probabilidades do modelo são razões simples `evento / total`,
//! acompanhadas da forma logarítmica natural.
//!
//! O log é fixado em `0.0` quando a razão é exatamente `0` ou `1`. Para `1`
//! isso coincide com `ln(1)`; para `0` substitui `-∞` por um valor finito, que
//! é o que os consumidores do relatório esperam.

use serde::{Deserialize, Serialize};

/// Uma razão em `[0, 1]` e seu logaritmo natural.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probability {
    pub value: f64,
    pub log: f64,
}

impl Probability {
    pub const ZERO: Probability = Probability { value: 0.0, log: 0.0 };

    /// `event / total`. Denominador zero resulta em [`Probability::ZERO`].
    ///
    /// Com o viés de suavização parcial, a contagem de um par pode superar a
    /// contagem da tag anterior; a razão é então limitada a `1`.
    pub fn from_counts(event: u32, total: u32) -> Self {
        if total == 0 {
            return Self::ZERO;
        }
        let value = (f64::from(event) / f64::from(total)).clamp(0.0, 1.0);
        let log = if value == 0.0 || value == 1.0 {
            0.0
        } else {
            value.ln()
        };
        Self { value, log }
    }
}
