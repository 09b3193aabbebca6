//! Demo Case Seed

use graph_store::{run_script, GraphStore, QueryError};
use tracing::info;

pub const DEMO_PATIENT_ID: &str = "P-001";
pub const DEMO_CASE_ID: &str = "Caso-001";

/// Frames, one patient with one case and its slots, and concept nodes
/// joined by fuzzy relationships. Every statement is idempotent.
pub const DEMO_SEED_SCRIPT: &str = "\
// Frames
MERGE (:Frame {name:'Paciente'});
MERGE (:Frame {name:'Sintoma'});
MERGE (:Frame {name:'TipoLesion'});
MERGE (:Frame {name:'Diagnostico'});
MERGE (:Frame {name:'Monitoreo'});
MERGE (:Frame {name:'Frecuencia'});

// Patient and case
MERGE (p:Paciente {id:'P-001'}) ON CREATE SET p.nombre = 'Paciente Demo';
MERGE (c:FrameInstance {id:'Caso-001'})
WITH c MATCH (f:Frame {name:'Diagnostico'}) MERGE (c)-[:INSTANCE_OF]->(f);
MATCH (p:Paciente {id:'P-001'}), (c:FrameInstance {id:'Caso-001'}) MERGE (p)-[:TIENE_CASO]->(c);

// Slots
MATCH (c:FrameInstance {id:'Caso-001'})
MERGE (c)-[:TIENE_SLOT]->(s:Slot:Dolor {slot_name:'dolor_actual'})
ON CREATE SET s.valor_crisp = 7.5,
              s.funcion_pertenencia = 'gaussiana',
              s.category_labels = ['leve', 'moderado', 'severo'],
              s.category_centers = [2.0, 5.0, 8.0],
              s.category_spreads = [1.5, 1.5, 1.2];
MATCH (c:FrameInstance {id:'Caso-001'})
MERGE (c)-[:TIENE_SLOT]->(s:Slot:Gravedad {slot_name:'gravedad_aparente'})
ON CREATE SET s.valor_crisp = 6.0;
MATCH (c:FrameInstance {id:'Caso-001'})
MERGE (c)-[:TIENE_SLOT]->(s:Slot:Mejora {slot_name:'mejora_observada'})
ON CREATE SET s.valor_crisp = 40.0,
              s.membership_labels = ['baja', 'media', 'alta'],
              s.memberships = [0.7, 0.3, 0.0];
MATCH (c:FrameInstance {id:'Caso-001'})
MERGE (c)-[:TIENE_SLOT]->(s:Slot:Frecuencia {slot_name:'intervalo_controles'})
ON CREATE SET s.valor_crisp = 7;

// Symptom with a pain-scale indicator
MATCH (p:Paciente {id:'P-001'})
MERGE (p)-[r:PRESENTA_SINTOMA]->(s:Sintoma {nombre:'Dolor'})
ON CREATE SET s.tipo = 'Dolor tobillo',
              s.intensidad = 'Intenso',
              r.etiqueta = 'Severo',
              r.mu = 0.8;
MATCH (:Paciente {id:'P-001'})-[:PRESENTA_SINTOMA]->(s:Sintoma {nombre:'Dolor'})
MERGE (s)-[:TIENE_INDICADOR]->(i:Indicador {nombre:'escala_dolor'})
ON CREATE SET i.valor_num = 7.5, i.unidad = 'EVA 0-10';

// Concepts and fuzzy relationships
MERGE (:TipoLesion {nombre:'Esguince tobillo'});
MERGE (:Diagnostico {codigo:'D-001'});
MERGE (:Monitoreo {id:'M-001'});
MERGE (:Frecuencia {descripcion:'Controles clínicos'});
MATCH (s:Sintoma {nombre:'Dolor'}), (t:TipoLesion {nombre:'Esguince tobillo'})
MERGE (s)-[r:ASOCIA_A]->(t) ON CREATE SET r.etiqueta = 'Muy probable', r.mu = 0.7;
MATCH (t:TipoLesion {nombre:'Esguince tobillo'}), (d:Diagnostico {codigo:'D-001'})
MERGE (t)-[r:ESPECIFICA_EN]->(d) ON CREATE SET r.etiqueta = 'II', r.mu = 0.6;
MATCH (d:Diagnostico {codigo:'D-001'}), (m:Monitoreo {id:'M-001'})
MERGE (d)-[r:PROGRAMA]->(m) ON CREATE SET r.etiqueta = 'Corta', r.mu = 0.7;
MATCH (m:Monitoreo {id:'M-001'}), (f:Frecuencia {descripcion:'Controles clínicos'})
MERGE (m)-[r:OCURRE_CADA]->(f) ON CREATE SET r.etiqueta = 'Media', r.mu = 0.6;
";

/// Load the demo case into the graph
pub async fn seed_demo_case<S: GraphStore + ?Sized>(store: &S) -> Result<usize, QueryError> {
    let executed = run_script(store, DEMO_SEED_SCRIPT).await?;
    info!("Seeded demo case {} ({} statements)", DEMO_CASE_ID, executed);
    Ok(executed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_store::{split_statements, MockGraphStore};

    #[test]
    fn test_seed_statements_are_self_contained() {
        let statements = split_statements(DEMO_SEED_SCRIPT);
        assert!(statements.len() > 20);
        for statement in &statements {
            assert!(!statement.starts_with("//"));
            assert!(
                statement.starts_with("MERGE") || statement.starts_with("MATCH"),
                "unexpected statement: {}",
                statement
            );
        }
    }

    #[test]
    fn test_seed_slots_use_category_lists() {
        assert!(DEMO_SEED_SCRIPT.contains("s.category_centers = [2.0, 5.0, 8.0]"));
        assert!(DEMO_SEED_SCRIPT.contains("s.memberships = [0.7, 0.3, 0.0]"));
        assert!(!DEMO_SEED_SCRIPT.contains("mu_severo"));
    }

    #[tokio::test]
    async fn test_seed_runs_every_statement() {
        let store = MockGraphStore::new();
        let executed = seed_demo_case(&store).await.unwrap();
        assert_eq!(executed, split_statements(DEMO_SEED_SCRIPT).len());
        assert_eq!(store.executed().len(), executed);
        assert_eq!(store.executed_matching("TIENE_SLOT").len(), 4);
    }

    #[tokio::test]
    async fn test_seed_stops_on_failure() {
        let store = MockGraphStore::new().fail_on("Slot:Gravedad", "Neo.ClientError", "denied");
        assert!(seed_demo_case(&store).await.is_err());
        assert!(store.executed_matching("Slot:Mejora").is_empty());
    }
}
