//! Query Profiles
//!
//! Schema text, few-shot examples and extra instructions for one sub-domain
//! of the injury graph.

use serde::{Deserialize, Serialize};

/// Everything the translator needs to know about a sub-domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryProfile {
    /// Profile key (e.g. "clinico")
    pub name: String,
    /// Labels, properties and relationships the model may use
    pub schema: String,
    /// Few-shot question/query pairs
    pub examples: String,
    /// Profile-specific instructions, one per line
    #[serde(default)]
    pub instructions: Vec<String>,
}

const CLINICAL_SCHEMA: &str = r#"
Labels:
  Paciente(obra_social, contacto, domicilio, observaciones, id, sexo, fecha_ingreso, nombre, edad)
  Sintoma(descripcion, lado, lugar_afectado, fecha_registro, intensidad, notas, id, nombre)
  Indicador(valor_num, valor, fecha_observacion, id, nombre)
  TipoLesion(descripcion, zona, gravedad_aparente, lado, causa, fecha_evento, id, nombre)
  Diagnostico(descripcion, grado, estado, fecha_diagnostico, id, comentarios)
  Tratamiento(objetivo, estado, lugar, observaciones, inicio, id, nombre)
  ProfesionalSalud(tipo, fecha_alta, institucion, id, nombre, especialidad)

Relationships:
  (Paciente)-[:PRESENTA_SINTOMA]->(Sintoma)
  (Sintoma)-[:TIENE_INDICADOR]->(Indicador)
  (Sintoma)-[:ASOCIA_A]->(TipoLesion)
  (TipoLesion)-[:ESPECIFICA_EN]->(Diagnostico)
  (Diagnostico)-[:SUGIERE_TRATAMIENTO]->(Tratamiento)
  (Tratamiento)-[:DERIVA_A]->(ProfesionalSalud)
"#;

const CLINICAL_EXAMPLES: &str = r#"
Ejemplos válidos de Cypher en este dominio (NO inventar labels/propiedades):

# Pregunta: "Una persona se torció el tobillo y tiene dolor, inflamación e inestabilidad. ¿Qué podría tener y qué tratamiento inicial se recomienda?"
MATCH (s1:Sintoma {nombre:"Dolor"})
MATCH (s2:Sintoma {nombre:"Inflamación"})
MATCH (s3:Sintoma {nombre:"Inestabilidad"})
MATCH (s1)-[:ASOCIA_A]->(t:TipoLesion)
MATCH (t)-[:ESPECIFICA_EN]->(d:Diagnostico)
MATCH (d)-[:SUGIERE_TRATAMIENTO]->(tr:Tratamiento)
RETURN t.nombre AS posible_lesion, d.descripcion AS diagnostico,
       tr.nombre AS tratamiento_inicial, tr.objetivo AS objetivo;

# Pregunta: "¿Qué síntomas presenta el paciente con el nombre Carlos López?"
MATCH (p:Paciente {nombre:"Carlos López"})-[:PRESENTA_SINTOMA]->(s:Sintoma)
RETURN s.nombre AS sintoma;

# Pregunta: "¿Qué indicadores se registraron para el síntoma Dolor del paciente Carlos López?"
MATCH (p:Paciente {nombre:"Carlos López"})-[:PRESENTA_SINTOMA]->(s:Sintoma {nombre:"Dolor"})
MATCH (s)-[:TIENE_INDICADOR]->(i:Indicador)
RETURN i.nombre AS indicador, i.valor_num AS valor_numerico,
       i.valor AS valor_descriptivo, i.fecha_observacion AS fecha_observacion;

# Pregunta: "¿Qué tipo de lesión se asocia a una Inflamación moderada?"
MATCH (s:Sintoma {nombre:"Inflamación"})-[:TIENE_INDICADOR]->(i:Indicador {valor:"moderada"})
MATCH (s)-[:ASOCIA_A]->(t:TipoLesion)
RETURN t.nombre AS tipo_lesion, t.gravedad_aparente AS gravedad_aparente,
       t.zona AS zona_afectada, t.lado AS lado_comprometido, t.descripcion AS descripcion;

# Pregunta: "¿Qué tratamiento se sugiere para el diagnóstico 'Esguince de tobillo derecho con inflamación'?"
MATCH (d:Diagnostico {descripcion:"Esguince de tobillo derecho con inflamación"})-[:SUGIERE_TRATAMIENTO]->(t:Tratamiento)
RETURN t.nombre AS tratamiento, t.objetivo AS objetivo, t.lugar AS lugar;
"#;

const MONITORING_SCHEMA: &str = r#"
Labels:
  Paciente(obra_social, contacto, domicilio, observaciones, id, sexo, fecha_ingreso, nombre, edad)
  Sintoma(descripcion, lado, lugar_afectado, fecha_registro, intensidad, notas, id, nombre)
  Indicador(valor_num, valor, fecha_observacion, id, nombre)
  TipoLesion(descripcion, zona, gravedad_aparente, lado, causa, fecha_evento, id, nombre)
  Diagnostico(descripcion, grado, estado, fecha_diagnostico, id, comentarios)
  Monitoreo(fecha, detalle, estado, observaciones, resultado_general, id)
  Frecuencia(id, cada, unidad, cantidad, observaciones)

Relationships:
  (Paciente)-[:PRESENTA_SINTOMA]->(Sintoma)
  (Sintoma)-[:TIENE_INDICADOR]->(Indicador)
  (Sintoma)-[:ASOCIA_A]->(TipoLesion)
  (TipoLesion)-[:ESPECIFICA_EN]->(Diagnostico)
  (TipoLesion)-[:REQUIERE_MONITOREO]->(Monitoreo)
  (Monitoreo)-[:OCURRE_CADA]->(Frecuencia)
  (Monitoreo)-[:ACTUALIZA]->(Diagnostico)
"#;

const MONITORING_EXAMPLES: &str = r#"
Ejemplos válidos de Cypher en este dominio (NO inventar labels/propiedades):

# Pregunta: "¿Qué monitoreos se recomiendan para una torcedura?"
MATCH (t:TipoLesion {nombre:"Torcedura"})-[:REQUIERE_MONITOREO]->(m:Monitoreo)
OPTIONAL MATCH (m)-[:OCURRE_CADA]->(f:Frecuencia)
RETURN t.nombre AS tipo_lesion, m.detalle AS detalle_monitoreo;

# Pregunta: "¿Cada cuánto se realiza el monitoreo de control funcional?"
MATCH (m:Monitoreo {detalle:"Control funcional"})-[:OCURRE_CADA]->(f:Frecuencia)
RETURN m.detalle AS detalle_monitoreo, f.cada AS cada, f.unidad AS unidad,
       f.cantidad AS cantidad, f.observaciones AS observaciones;

# Pregunta: "¿Qué tipos de monitoreos existen?"
MATCH (m:Monitoreo)
RETURN DISTINCT m.detalle AS tipo_monitoreo;

# Pregunta: "¿Qué frecuencias existen?"
MATCH (f:Frecuencia)
RETURN DISTINCT f.cantidad AS cantidad, f.unidad AS unidad;

# Pregunta: "¿Qué resultado general se registró para el monitoreo 'Control inicial'?"
MATCH (m:Monitoreo {detalle:"Control inicial"})-[:ACTUALIZA]->(d:Diagnostico)
RETURN m.detalle AS detalle_monitoreo, m.resultado_general AS resultado_general;

# Pregunta: "La persona sigue con dolor y rigidez en el tobillo. ¿Cada cuánto habría que controlarlo?"
MATCH (s1:Sintoma {nombre:"Dolor"})-[:ASOCIA_A]->(t:TipoLesion)
MATCH (s2:Sintoma {nombre:"Rigidez"})-[:ASOCIA_A]->(t)
MATCH (t)-[:REQUIERE_MONITOREO]->(m:Monitoreo)
OPTIONAL MATCH (m)-[:OCURRE_CADA]->(f:Frecuencia)
RETURN t.nombre AS tipo_lesion, m.detalle AS tipo_monitoreo, f.cantidad AS cantidad,
       f.unidad AS unidad, f.cada AS cada, f.observaciones AS observaciones;
"#;

impl QueryProfile {
    pub const CLINICAL: &'static str = "clinico";
    pub const MONITORING: &'static str = "monitoreo";

    /// General clinical sub-domain: patients, symptoms, injuries, treatments
    pub fn clinical() -> Self {
        Self {
            name: Self::CLINICAL.to_string(),
            schema: CLINICAL_SCHEMA.trim().to_string(),
            examples: CLINICAL_EXAMPLES.trim().to_string(),
            instructions: vec![
                "La entidad Paciente se identifica SIEMPRE con la propiedad `id`; la propiedad `dni` NO EXISTE.".to_string(),
                "Prefiere MATCH y propiedades exactas cuando se proveen (por ejemplo: id, nombre).".to_string(),
                "La relación ASOCIA_A SIEMPRE va de Sintoma a TipoLesion, nunca desde Indicador.".to_string(),
                "En TipoLesion identifica el tipo SIEMPRE por 'nombre', nunca por 'descripcion'.".to_string(),
                "Para tratamientos sugeridos usa (Diagnostico)-[:SUGIERE_TRATAMIENTO]->(Tratamiento).".to_string(),
            ],
        }
    }

    /// Monitoring and follow-up frequency sub-domain
    pub fn monitoring() -> Self {
        Self {
            name: Self::MONITORING.to_string(),
            schema: MONITORING_SCHEMA.trim().to_string(),
            examples: MONITORING_EXAMPLES.trim().to_string(),
            instructions: vec![
                "Para Monitoreo usa solamente: fecha, detalle, estado, observaciones, resultado_general, id.".to_string(),
                "Para Frecuencia usa solamente: cada, unidad, cantidad, observaciones, id.".to_string(),
                "La propiedad 'tipo' NO EXISTE en Monitoreo; identifica un monitoreo por 'detalle'.".to_string(),
                "Responde SIEMPRE en español.".to_string(),
            ],
        }
    }

    /// Built-in profile by name
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            Self::CLINICAL => Some(Self::clinical()),
            Self::MONITORING => Some(Self::monitoring()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(QueryProfile::builtin("clinico").unwrap().name, "clinico");
        assert_eq!(QueryProfile::builtin("monitoreo").unwrap().name, "monitoreo");
        assert!(QueryProfile::builtin("otro").is_none());
    }

    #[test]
    fn test_monitoring_schema_uses_detalle() {
        let profile = QueryProfile::monitoring();
        assert!(profile.schema.contains("Monitoreo(fecha, detalle"));
        assert!(profile.examples.contains("m.detalle"));
        assert!(!profile.examples.contains("m.tipo"));
    }
}
