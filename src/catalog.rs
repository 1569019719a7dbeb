// 📚 Course Catalog - area → course → lessons
//
// Read-only nested table. Access goes through `open`, which checks the
// session for a successful registration.

use crate::session::Session;
use once_cell::sync::Lazy;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub name: String,
    pub lessons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Area {
    pub name: String,
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    areas: Vec<Area>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Please complete a registration before accessing the courses.")]
    RegistrationRequired,
}

// ============================================================================
// STANDARD CATALOG
// ============================================================================

fn course(name: &str, lessons: [&str; 6]) -> Course {
    Course {
        name: name.to_string(),
        lessons: lessons.iter().map(|l| l.to_string()).collect(),
    }
}

fn area(name: &str, courses: Vec<Course>) -> Area {
    Area {
        name: name.to_string(),
        courses,
    }
}

static STANDARD: Lazy<Catalog> = Lazy::new(|| Catalog {
    areas: vec![
        area(
            "Saúde",
            vec![
                course(
                    "Medicina",
                    [
                        "Anatomia Humana",
                        "Fisiologia",
                        "Farmacologia",
                        "Patologia",
                        "Clínica Médica",
                        "Cirurgia Geral",
                    ],
                ),
                course(
                    "Odontologia",
                    [
                        "Anatomia Dentária",
                        "Periodontia",
                        "Endodontia",
                        "Prótese Dentária",
                        "Radiologia Odontológica",
                        "Cirurgia Buco-maxilo-facial",
                    ],
                ),
            ],
        ),
        area(
            "Tecnologia",
            vec![course(
                "Análise e Desenvolvimento de Sistemas",
                [
                    "Algoritmos e Programação",
                    "Estrutura de Dados",
                    "Desenvolvimento Web",
                    "Banco de Dados",
                    "Engenharia de Software",
                    "Redes de Computadores",
                ],
            )],
        ),
        area(
            "Ciências Humanas",
            vec![
                course(
                    "Direito",
                    [
                        "Direito Constitucional",
                        "Direito Penal",
                        "Direito Civil",
                        "Direito Empresarial",
                        "Direito Trabalhista",
                        "Direito Internacional",
                    ],
                ),
                course(
                    "Psicologia",
                    [
                        "Teorias da Personalidade",
                        "Psicologia do Desenvolvimento",
                        "Psicopatologia",
                        "Psicologia Social",
                        "Neuropsicologia",
                        "Psicoterapia",
                    ],
                ),
            ],
        ),
        area(
            "Ciências Sociais",
            vec![course(
                "Administração",
                [
                    "Introdução à Administração",
                    "Marketing",
                    "Gestão de Pessoas",
                    "Contabilidade",
                    "Finanças Empresariais",
                    "Planejamento Estratégico",
                ],
            )],
        ),
    ],
});

/// Catalog for a session that has registered
pub fn open(session: &Session) -> Result<&'static Catalog, CatalogError> {
    if session.has_registration() {
        Ok(Catalog::standard())
    } else {
        Err(CatalogError::RegistrationRequired)
    }
}

// ============================================================================
// LOOKUPS
// ============================================================================

impl Catalog {
    /// The institute's fixed catalog, without the session check
    pub fn standard() -> &'static Catalog {
        &STANDARD
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn area(&self, name: &str) -> Option<&Area> {
        self.areas.iter().find(|a| a.name == name)
    }

    /// Course by name across all areas, with its area
    pub fn course(&self, name: &str) -> Option<(&Area, &Course)> {
        self.areas
            .iter()
            .flat_map(|a| a.courses.iter().map(move |c| (a, c)))
            .find(|(_, c)| c.name == name)
    }

    pub fn course_count(&self) -> usize {
        self.areas.iter().map(|a| a.courses.len()).sum()
    }

    pub fn lesson_count(&self) -> usize {
        self.areas
            .iter()
            .flat_map(|a| a.courses.iter())
            .map(|c| c.lessons.len())
            .sum()
    }
}
