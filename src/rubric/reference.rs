use super::types::{Rubric, RubricIndicator, ScoreLevel, ScorePoints};

/// Level names shared by every indicator of the reference rubric, lowest first
const LEVEL_NAMES: [&str; 4] = [
    "Desarrollo Débil",
    "Desarrollo Incipiente",
    "Desarrollo Satisfactorio",
    "Desarrollo Avanzado",
];

/// Course labels of the reference deployment
pub const REFERENCE_COURSES: [&str; 4] = ["3ºA", "3ºB", "3ºC", "3ºD"];

fn indicator(id: &str, title: &str, descriptions: [&str; 4]) -> RubricIndicator {
    let levels = ScorePoints::all()
        .zip(LEVEL_NAMES.iter().zip(descriptions.iter()))
        .map(|(points, (name, description))| ScoreLevel {
            points,
            level_name: name.to_string(),
            description: description.to_string(),
        })
        .collect();

    RubricIndicator {
        id: id.to_string(),
        title: title.to_string(),
        levels,
    }
}

/// The 13-indicator dual-presentation rubric used when no rubric is configured.
pub fn reference_rubric() -> Rubric {
    Rubric::new(vec![
        indicator(
            "indicador1",
            "Presentación personal",
            [
                "Presentación básica de datos personales, vestimenta adecuada",
                "Incluye desarrollo de aprendizajes e hitos de últimos 2 años, sin piercing",
                "Agrega reconocimiento de habilidades, competencias, metas y proyecciones",
                "Incluye aspectos a fortalecer y ejemplo de experiencia DUAL",
            ],
        ),
        indicator(
            "indicador2",
            "Descripción de su proceso de vinculación en la alternancia DUAL",
            [
                "Descripción superficial del proceso de vinculación",
                "Descripción detallada de pasos, involucrados y roles",
                "Incluye sentimientos y emociones del proceso",
                "Agrega estrategias para gestionar emociones",
            ],
        ),
        indicator(
            "indicador3",
            "Descripción del centro de aprendizaje",
            [
                "Características generales básicas",
                "Incluye organigrama y profesionales de interacción",
                "Explica procesos de producción/servicio detalladamente",
                "Identifica 10 características y matriz FODA",
            ],
        ),
        indicator(
            "indicador4",
            "Experiencia de trabajo en Equipo",
            [
                "Describe experiencia observada de trabajo en equipo",
                "Experiencia asignada, funciones y objetivo común",
                "Identifica dificultades del proceso",
                "Explica cómo resolvió las dificultades",
            ],
        ),
        indicator(
            "indicador5",
            "Experiencia de resolución de conflictos",
            [
                "Identifica crisis/conflicto observado",
                "Reconoce componentes y alternativas de resolución",
                "Identifica componentes, situaciones, emociones y resolución",
                "Presenta alternativas adicionales de resolución",
            ],
        ),
        indicator(
            "indicador6",
            "Experiencia Técnica",
            [
                "Explica tareas generales sin experiencia específica",
                "Experiencia específica con vocabulario técnico parcial",
                "Vocabulario técnico completo, vincula habilidades, identifica errores",
                "Plantea propuestas de mejora para futuras tareas",
            ],
        ),
        indicator(
            "indicador7",
            "Propuesta de mejora",
            [
                "Propuesta sin diagnóstico claro",
                "Identifica oportunidades y propone acción específica",
                "Incluye comparación y flujograma/ejemplos",
                "Propuesta de implementación real",
            ],
        ),
        indicator(
            "indicador8",
            "Evaluación de su desarrollo y aprendizaje",
            [
                "Resume experiencia y tareas generales",
                "Detalla aprendizajes y experiencias significativas",
                "Explica impacto de aprendizajes en el futuro",
                "Reconoce elementos por aprender y propuesta para lograrlo",
            ],
        ),
        indicator(
            "indicador9",
            "Expresión oral",
            [
                "Ideas sin claridad en argumentos",
                "Ideas claras, elocuentes y fluidas",
                "Adecua comunicación al contexto y receptor",
                "Estrategias para captar atención, buena oratoria y disposición",
            ],
        ),
        indicator(
            "indicador10",
            "Presentación",
            [
                "Al menos un recurso innovador/creativo",
                "Presentación atractiva con recursos físicos y digitales",
                "Mantiene formalidad durante exposición",
                "Responde preguntas de participantes",
            ],
        ),
        indicator(
            "indicador11",
            "Uso eficiente del Tiempo",
            [
                "Menos de 6 minutos",
                "6-8 minutos, elementos parciales",
                "8-10 minutos, elementos completos sin profundidad",
                "10-12 minutos, profundidad en todos los elementos",
            ],
        ),
        indicator(
            "indicador12",
            "Empatía",
            [
                "Respeto ocasional hacia compañeros/docentes",
                "Respeto constante, necesita recordatorio de contexto",
                "Respeto permanente, atiende presentaciones de pares",
                "Demuestra inquietudes y valoraciones oportunas",
            ],
        ),
        indicator(
            "indicador13",
            "Normas de Seguridad",
            [
                "Algunos EPPs y normas, o solo uno de los criterios",
                "Algunos EPPs y normas de seguridad",
                "Todos los EPPs y normas de seguridad",
                "Detalla importancia de EPPs y reconoce normas",
            ],
        ),
    ])
}
