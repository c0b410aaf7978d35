//! # Reference Catalogs
//!
//! Operation types, detracción types and detracción payment methods,
//! fetched once when the invoice screen opens.

use facturador_core::{MedioPagoDetraccion, OperationType, TipoDetraccion};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::CatalogSource;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalogs {
    pub operation_types: Vec<OperationType>,
    pub tipos_detraccion: Vec<TipoDetraccion>,
    pub medios_pago: Vec<MedioPagoDetraccion>,
}

impl Catalogs {
    /// Fetches the three catalogs concurrently.
    pub async fn load(source: &dyn CatalogSource) -> ClientResult<Self> {
        debug!("Loading reference catalogs");
        let (operation_types, tipos_detraccion, medios_pago) = tokio::try_join!(
            source.operation_types(),
            source.tipos_detraccion(),
            source.medios_pago_detraccion(),
        )?;

        info!(
            operation_types = operation_types.len(),
            tipos_detraccion = tipos_detraccion.len(),
            medios_pago = medios_pago.len(),
            "Catalogs loaded"
        );

        Ok(Catalogs {
            operation_types,
            tipos_detraccion,
            medios_pago,
        })
    }

    pub fn operation_type(&self, id: i64) -> ClientResult<&OperationType> {
        self.operation_types
            .iter()
            .find(|op| op.id == id)
            .ok_or_else(|| not_found("Operation type", id.to_string()))
    }

    /// Finds an operation type by its SUNAT code (`0101`, `0112`...).
    pub fn operation_type_by_code(&self, code: &str) -> ClientResult<&OperationType> {
        let code = code.trim();
        self.operation_types
            .iter()
            .find(|op| op.codigo == code)
            .ok_or_else(|| not_found("Operation type", code.to_string()))
    }

    pub fn tipo_detraccion(&self, id: i64) -> ClientResult<&TipoDetraccion> {
        self.tipos_detraccion
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("Detracción type", id.to_string()))
    }

    pub fn medio_pago(&self, id: i64) -> ClientResult<&MedioPagoDetraccion> {
        self.medios_pago
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| not_found("Detracción payment method", id.to_string()))
    }
}

fn not_found(entity: &'static str, key: String) -> ClientError {
    ClientError::NotFound { entity, key }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct FixedCatalogs;

    #[async_trait]
    impl CatalogSource for FixedCatalogs {
        async fn operation_types(&self) -> ClientResult<Vec<OperationType>> {
            Ok(vec![
                OperationType {
                    id: 1,
                    codigo: "0101".to_string(),
                    descripcion: "Venta interna".to_string(),
                    allows_global_discount: true,
                },
                OperationType {
                    id: 2,
                    codigo: "0112".to_string(),
                    descripcion: "Venta sujeta a detracción".to_string(),
                    allows_global_discount: false,
                },
            ])
        }

        async fn tipos_detraccion(&self) -> ClientResult<Vec<TipoDetraccion>> {
            Ok(vec![TipoDetraccion {
                id: 37,
                codigo: "037".to_string(),
                descripcion: "Demás servicios gravados con el IGV".to_string(),
                porcentaje: dec!(12),
            }])
        }

        async fn medios_pago_detraccion(&self) -> ClientResult<Vec<MedioPagoDetraccion>> {
            Ok(vec![MedioPagoDetraccion {
                id: 1,
                codigo: "001".to_string(),
                descripcion: "Depósito en cuenta".to_string(),
            }])
        }
    }

    struct Offline;

    #[async_trait]
    impl CatalogSource for Offline {
        async fn operation_types(&self) -> ClientResult<Vec<OperationType>> {
            Err(ClientError::Http("connection refused".into()))
        }

        async fn tipos_detraccion(&self) -> ClientResult<Vec<TipoDetraccion>> {
            Ok(Vec::new())
        }

        async fn medios_pago_detraccion(&self) -> ClientResult<Vec<MedioPagoDetraccion>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_load_and_lookup() {
        let catalogs = Catalogs::load(&FixedCatalogs).await.unwrap();

        assert_eq!(catalogs.operation_type(2).unwrap().codigo, "0112");
        assert_eq!(catalogs.operation_type_by_code(" 0101 ").unwrap().id, 1);
        assert_eq!(catalogs.tipo_detraccion(37).unwrap().porcentaje, dec!(12));
        assert_eq!(catalogs.medio_pago(1).unwrap().codigo, "001");
    }

    #[tokio::test]
    async fn test_missing_entries() {
        let catalogs = Catalogs::load(&FixedCatalogs).await.unwrap();

        let err = catalogs.tipo_detraccion(99).unwrap_err();
        assert!(matches!(err, ClientError::NotFound { entity: "Detracción type", .. }));
        assert!(catalogs.operation_type_by_code("0200").is_err());
    }

    #[tokio::test]
    async fn test_load_fails_when_any_catalog_fails() {
        let err = Catalogs::load(&Offline).await.unwrap_err();
        assert!(err.is_transient());
    }
}
