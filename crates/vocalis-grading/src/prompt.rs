//! The grading instruction and the `generateContent` request built from it.

use serde::Serialize;

pub const TEMPERATURE: f32 = 0.7;
pub const TOP_P: f32 = 1.0;
pub const TOP_K: u32 = 1;
pub const MAX_OUTPUT_TOKENS: u32 = 2048;

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];
const BLOCK_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// Builds the Spanish grading instruction with both texts embedded verbatim.
pub fn build_prompt(problem_text: &str, user_answer: &str) -> String {
    format!(
        r#"Eres un asistente experto y amable que evalúa respuestas a problemas de lógica de programación para estudiantes.
IMPORTANTE: La respuesta del usuario viene de una transcripción de voz, por lo que puede contener pequeños errores (por ejemplo 'ford' en vez de 'for', 'smart.h' en vez de 'math.h'). Sé tolerante con estos errores menores si la lógica subyacente es comprensible. Enfócate en evaluar el *proceso lógico* descrito.

Evalúa la siguiente respuesta de un usuario al problema dado. Proporciona:
1. Un análisis constructivo y conciso sobre la LÓGICA de la respuesta. Indica si el enfoque es correcto, si es eficiente, si considera casos borde (si aplica) y ofrece sugerencias claras de mejora. No juzgues errores menores de sintaxis o nombres si la idea es clara. Si el usuario menciona una función o concepto clave (como 'len' o 'bucle'), reconócelo positivamente cuando sea apropiado para el problema.
2. Una calificación numérica ENTERA del 0 al 10. Escala: 0=Vacío/Sin sentido, 1-3=Incorrecto/Muy incompleto, 4-6=Idea básica correcta pero con errores lógicos o muy incompleta, 7-8=Correcto pero mejorable (claridad, eficiencia), 9=Muy bien, casi perfecto, 10=Perfecto, claro, conciso y eficiente.
3. Intenta reconstruir lo que el usuario quiso decir aunque no sea perfecto. El usuario es un estudiante que habla mientras piensa: puede haber trabas, repeticiones, palabras sin sentido o malas transcripciones. Ayúdale a mejorar su respuesta y, ante errores graves, sé claro y directo.

Problema:
"""
{problem_text}
"""

Respuesta del Usuario (transcrita de voz):
"""
{user_answer}
"""

RESPUESTA OBLIGATORIA EN FORMATO JSON VÁLIDO (SOLO EL JSON, SIN NADA MÁS ANTES O DESPUÉS, SIN MARKDOWN ```json ... ```):
{{"analysis": "string con tu análisis aquí", "grade": integer de 0 a 10 aquí}}
"#
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct SafetySetting {
    pub category: &'static str,
    pub threshold: &'static str,
}

impl GenerateContentRequest {
    /// A single-turn grading request with the fixed sampling and safety settings.
    pub fn grading(problem_text: &str, user_answer: &str) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: build_prompt(problem_text, user_answer),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                top_k: TOP_K,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: BLOCK_THRESHOLD,
                })
                .collect(),
        }
    }
}
