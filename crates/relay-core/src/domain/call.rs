//! Call envelope: the internal representation of one outbound power-on call.
//!
//! This is the JSON document stored in the record's `Call` column by the
//! upstream producer. Field names follow that producer's camelCase contract.
//! Every field the wire schema requires is non-optional here, so a record that
//! decodes is structurally complete for translation.

use serde::{Deserialize, Serialize};

use super::ids::{CallId, CorrelationId};

/// One remote call: where to send it, how to correlate it, where to forward the
/// answer, and the SOAP payload itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEnvelope {
    #[serde(rename = "symXCallId", default)]
    pub call_id: CallId,

    #[serde(default)]
    pub correlation_id: CorrelationId,

    /// Queue that receives the raw response on success.
    pub callback_queue: String,

    /// Target endpoint URL.
    #[serde(rename = "symXInstanceUrl")]
    pub instance_url: String,

    /// Name of the power-on program; carried for callers, unused by translation.
    #[serde(rename = "symXPowerOn", default, skip_serializing_if = "Option::is_none")]
    pub power_on: Option<String>,

    #[serde(rename = "symXEnvelope")]
    pub soap: SoapEnvelope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoapEnvelope {
    #[serde(default)]
    pub header: SoapHeader,
    pub body: SoapBody,
}

/// The SOAP header carries nothing for this endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoapHeader {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoapBody {
    #[serde(rename = "executePowerOnReturnArray")]
    pub execute_power_on_return_array: PowerOnOperation,
}

/// Operation element of the power-on service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerOnOperation {
    pub request: Request,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub branch_id: i32,
    pub credentials: Credentials,
    pub device_information: DeviceInformation,
    pub header: RequestHeader,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub processor_user: String,
    pub administrative_credentials: AdministrativeCredentials,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdministrativeCredentials {
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInformation {
    pub device_type: String,
    pub device_number: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestHeader {
    #[serde(rename = "messageID")]
    pub message_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rg_session: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_defined_parameters: Option<UserDefinedParameters>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Typed key/value parameters handed to the power-on program.
/// Each list keeps the order the producer wrote it in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDefinedParameters {
    #[serde(rename = "rgUserChr", default)]
    pub characters: Vec<UserChr>,

    #[serde(rename = "rgUserNum", default)]
    pub numbers: Vec<UserNum>,
}

impl UserDefinedParameters {
    pub fn with_chr(mut self, id: i32, value: impl Into<String>) -> Self {
        self.characters.push(UserChr {
            id,
            value: value.into(),
        });
        self
    }

    pub fn with_num(mut self, id: i32, value: i32) -> Self {
        self.numbers.push(UserNum { id, value });
        self
    }
}

/// Character-valued parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChr {
    pub id: i32,
    pub value: String,
}

/// Numeric-valued parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNum {
    pub id: i32,
    pub value: i32,
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_producer_json() {
        let raw = json!({
            "symXCallId": "call-9",
            "correlationId": "corr-9",
            "callbackQueue": "cb-9",
            "symXInstanceUrl": "https://symx.example/poweron",
            "symXPowerOn": "RDC.DEPOSIT",
            "symXEnvelope": {
                "header": {},
                "body": {
                    "executePowerOnReturnArray": {
                        "request": {
                            "branchId": 1,
                            "credentials": {
                                "processorUser": "1999",
                                "administrativeCredentials": { "password": "pw" }
                            },
                            "deviceInformation": { "deviceType": "RDC", "deviceNumber": 7 },
                            "header": { "messageID": "m-1" },
                            "body": {
                                "file": "RDC.DEPOSIT",
                                "userDefinedParameters": {
                                    "rgUserChr": [{ "id": 1, "value": "a" }],
                                    "rgUserNum": [{ "id": 2, "value": 5 }]
                                }
                            }
                        }
                    }
                }
            }
        });

        let call: CallEnvelope = serde_json::from_value(raw).unwrap();
        assert_eq!(call.call_id.as_str(), "call-9");
        assert_eq!(call.callback_queue, "cb-9");

        let request = &call.soap.body.execute_power_on_return_array.request;
        assert_eq!(request.device_information.device_number, 7);
        assert_eq!(request.header.message_id, "m-1");
        assert_eq!(request.body.rg_session, None);
        assert_eq!(request.body.user, None);

        let params = request.body.user_defined_parameters.as_ref().unwrap();
        assert_eq!(params.characters[0].value, "a");
        assert_eq!(params.numbers[0].value, 5);
    }

    #[test]
    fn absent_optionals_are_not_serialized() {
        let body = RequestBody::default();
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({}));
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let raw = json!({
            "symXCallId": "call-9",
            "callbackQueue": "cb-9",
            "symXInstanceUrl": "https://symx.example/poweron"
        });
        assert!(serde_json::from_value::<CallEnvelope>(raw).is_err());
    }
}
