//! Prompt Templates and Output Cleanup

use graph_store::Record;

const TRANSLATION_TEMPLATE: &str = "\
Eres un asistente experto en Cypher para Neo4j.
Usa EXCLUSIVAMENTE las Labels, propiedades y Relationships del esquema.
Esquema:
{schema}

Ejemplos de consultas correctas (few-shot):
{examples}

Instrucciones IMPORTANTES:
- No inventes labels o propiedades.
{instructions}- Devuelve SOLO la consulta Cypher, sin explicación adicional.

Pregunta: {question}
";

const ANSWER_TEMPLATE: &str = "\
Eres un asistente que redacta respuestas claras y breves en español.
La siguiente información proviene de la base de conocimiento sobre esguinces y torceduras
y es la única fuente autorizada; no la contradigas ni agregues datos propios.
Información:
{context}

Pregunta: {question}
Respuesta útil:";

/// Leading labels models sometimes put before the query
const QUERY_PREFIXES: [&str; 3] = ["Consulta:", "Query:", "Cypher:"];

/// Prompt asking the model for a single graph query
pub fn translation_prompt(question: &str, schema: &str, examples: &str, instructions: &[String]) -> String {
    let instructions: String = instructions.iter().map(|i| format!("- {}\n", i)).collect();

    TRANSLATION_TEMPLATE
        .replace("{instructions}", &instructions)
        .replace("{schema}", schema)
        .replace("{examples}", examples)
        .replace("{question}", question)
}

/// Prompt asking the model to phrase query rows as an answer
pub fn answer_prompt(question: &str, rows: &[Record]) -> String {
    let context = serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string());

    ANSWER_TEMPLATE
        .replace("{context}", &context)
        .replace("{question}", question)
}

/// Strip code fences and label prefixes from raw model output
pub fn clean_query_output(text: &str) -> String {
    let mut query = text.trim().to_string();

    if query.starts_with("```") {
        let mut lines: Vec<&str> = query.lines().collect();
        if lines.first().map_or(false, |l| l.starts_with("```")) {
            lines.remove(0);
        }
        if lines.last().map_or(false, |l| l.trim().starts_with("```")) {
            lines.pop();
        }
        query = lines.join("\n").trim().to_string();
    }

    for prefix in QUERY_PREFIXES {
        let has_prefix = query
            .get(..prefix.len())
            .map_or(false, |head| head.eq_ignore_ascii_case(prefix));
        if has_prefix {
            query = query[prefix.len()..].trim().to_string();
        }
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_fenced_output() {
        let raw = "```cypher\nMATCH (m:Monitoreo)\nRETURN DISTINCT m.detalle\n```";
        assert_eq!(clean_query_output(raw), "MATCH (m:Monitoreo)\nRETURN DISTINCT m.detalle");
    }

    #[test]
    fn test_clean_prefixed_output() {
        assert_eq!(clean_query_output("  cypher: MATCH (n) RETURN n "), "MATCH (n) RETURN n");
        assert_eq!(clean_query_output("Consulta:\nMATCH (n) RETURN n"), "MATCH (n) RETURN n");
    }

    #[test]
    fn test_clean_plain_output_unchanged() {
        assert_eq!(clean_query_output("MATCH (s:Sintoma) RETURN count(s)"), "MATCH (s:Sintoma) RETURN count(s)");
    }

    #[test]
    fn test_translation_prompt_sections() {
        let prompt = translation_prompt(
            "¿Qué síntomas existen?",
            "Labels: Sintoma(nombre)",
            "MATCH (s:Sintoma) RETURN s",
            &["Usa solo nombre.".to_string()],
        );
        assert!(prompt.contains("Esquema:\nLabels: Sintoma(nombre)"));
        assert!(prompt.contains("- Usa solo nombre.\n- Devuelve SOLO"));
        assert!(prompt.ends_with("Pregunta: ¿Qué síntomas existen?\n"));
    }

    #[test]
    fn test_answer_prompt_embeds_rows() {
        let rows = vec![Record::try_from(json!({"sintoma": "Dolor"})).unwrap()];
        let prompt = answer_prompt("¿Qué síntomas?", &rows);
        assert!(prompt.contains("\"sintoma\": \"Dolor\""));
    }
}
