//! pt_BR synthetic data: person names, phone numbers, cities, company names
//! and CNPJ tax ids.
//!
//! One method call produces one field value. A [`Faker`] owns its RNG, so
//! every benchmark iteration can start from a fresh seed without any shared
//! state.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const FIRST_NAMES: [&str; 48] = [
    "Alessandra", "Alice", "Aline", "Ana", "André", "Antônio", "Beatriz", "Bruno", "Caio",
    "Camila", "Carlos", "Carolina", "Daniel", "Davi", "Eduarda", "Eduardo", "Felipe", "Fernanda",
    "Gabriel", "Gabriela", "Guilherme", "Gustavo", "Heitor", "Helena", "Isabela", "João",
    "Júlia", "Larissa", "Leonardo", "Letícia", "Lucas", "Luiza", "Manuela", "Marcos", "Maria",
    "Mariana", "Matheus", "Miguel", "Natália", "Paulo", "Pedro", "Rafael", "Rafaela", "Samuel",
    "Sofia", "Thiago", "Valentina", "Vitória",
];

const LAST_NAMES: [&str; 40] = [
    "Albuquerque", "Almeida", "Alves", "Araújo", "Barbosa", "Barros", "Batista", "Cardoso",
    "Carvalho", "Castro", "Costa", "Dias", "Duarte", "Fernandes", "Ferreira", "Freitas", "Gomes",
    "Lima", "Lopes", "Macedo", "Martins", "Melo", "Mendes", "Moraes", "Moreira", "Nascimento",
    "Nogueira", "Oliveira", "Pereira", "Pinto", "Reis", "Ribeiro", "Rocha", "Rodrigues",
    "Santos", "Silva", "Souza", "Teixeira", "Vieira", "Xavier",
];

const COMPANY_SUFFIXES: [&str; 5] = ["S.A.", "LTDA", "EIRELI", "e Associados", "Comércio"];

const CITIES: [&str; 32] = [
    "São Paulo", "Rio de Janeiro", "Belo Horizonte", "Brasília", "Salvador", "Fortaleza",
    "Curitiba", "Manaus", "Recife", "Porto Alegre", "Belém", "Goiânia", "Guarulhos", "Campinas",
    "São Luís", "Maceió", "Natal", "Teresina", "Campo Grande", "João Pessoa", "Osasco",
    "Santo André", "Ribeirão Preto", "Uberlândia", "Sorocaba", "Contagem", "Aracaju",
    "Feira de Santana", "Cuiabá", "Joinville", "Florianópolis", "Londrina",
];

/// Valid Brazilian area codes (DDD).
const AREA_CODES: [u8; 27] = [
    11, 21, 27, 31, 41, 47, 48, 51, 61, 62, 65, 67, 68, 69, 71, 79, 81, 82, 83, 84, 85, 86, 91,
    92, 95, 96, 98,
];

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Synthetic data generator scoped to the pt_BR locale.
pub struct Faker {
    rng: StdRng,
}

impl Faker {
    /// Generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, values: &'static [&'static str]) -> &'static str {
        values.choose(&mut self.rng).copied().unwrap_or_default()
    }

    pub fn first_name(&mut self) -> String {
        self.pick(&FIRST_NAMES).to_string()
    }

    pub fn last_name(&mut self) -> String {
        self.pick(&LAST_NAMES).to_string()
    }

    pub fn full_name(&mut self) -> String {
        let first = self.first_name();
        let last = self.last_name();
        format!("{first} {last}")
    }

    pub fn city(&mut self) -> String {
        self.pick(&CITIES).to_string()
    }

    /// One of `"{last} {suffix}"`, `"{last} - {last}"` or
    /// `"{last}, {last} e {last}"`.
    pub fn company_name(&mut self) -> String {
        match self.rng.gen_range(0..3) {
            0 => {
                let last = self.pick(&LAST_NAMES);
                let suffix = self.pick(&COMPANY_SUFFIXES);
                format!("{last} {suffix}")
            }
            1 => {
                let a = self.pick(&LAST_NAMES);
                let b = self.pick(&LAST_NAMES);
                format!("{a} - {b}")
            }
            _ => {
                let a = self.pick(&LAST_NAMES);
                let b = self.pick(&LAST_NAMES);
                let c = self.pick(&LAST_NAMES);
                format!("{a}, {b} e {c}")
            }
        }
    }

    /// `(DD) 9XXXX-XXXX` for mobiles, `(DD) XXXX-XXXX` for landlines.
    pub fn phone_number(&mut self) -> String {
        let area = AREA_CODES.choose(&mut self.rng).copied().unwrap_or(11);
        let suffix: u32 = self.rng.gen_range(0..10_000);
        if self.rng.gen_bool(0.5) {
            let prefix: u32 = self.rng.gen_range(0..10_000);
            format!("({area}) 9{prefix:04}-{suffix:04}")
        } else {
            let prefix: u32 = self.rng.gen_range(2_000..6_000);
            format!("({area}) {prefix}-{suffix:04}")
        }
    }

    /// Head-office CNPJ: 8 random base digits, branch `0001`, two check
    /// digits. No format symbols.
    pub fn cnpj(&mut self) -> String {
        let mut digits = [0u32; 14];
        for d in digits.iter_mut().take(8) {
            *d = self.rng.gen_range(0..10);
        }
        digits[11] = 1;
        digits[12] = cnpj_check_digit(&digits[..12], &CNPJ_FIRST_WEIGHTS);
        digits[13] = cnpj_check_digit(&digits[..13], &CNPJ_SECOND_WEIGHTS);

        digits
            .iter()
            .filter_map(|&d| char::from_digit(d, 10))
            .collect()
    }
}

fn cnpj_check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        0 | 1 => 0,
        r => 11 - r,
    }
}

/// Validate a 14-digit CNPJ without format symbols.
pub fn is_valid_cnpj(value: &str) -> bool {
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 14 || value.len() != 14 {
        return false;
    }
    digits[12] == cnpj_check_digit(&digits[..12], &CNPJ_FIRST_WEIGHTS)
        && digits[13] == cnpj_check_digit(&digits[..13], &CNPJ_SECOND_WEIGHTS)
}
