use aws_config::SdkConfig;
use aws_sdk_lambda::Client as LambdaClient;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sns::Client as SnsClient;
use aws_sdk_sqs::Client as SqsClient;

use crate::services::Services;

/// A type used to hold the AWS clients required by the wrangler functions.
#[derive(Clone)]
pub struct AwsClients {
    pub s3: S3Client,
    pub sqs: SqsClient,
    pub sns: SnsClient,
    pub lambda: LambdaClient,
}

impl AwsClients {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        AwsClients {
            s3: S3Client::new(sdk_config),
            sqs: SqsClient::new(sdk_config),
            sns: SnsClient::new(sdk_config),
            lambda: LambdaClient::new(sdk_config),
        }
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            store: &self.s3,
            invoker: &self.lambda,
            queue: &self.sqs,
            topic: &self.sns,
        }
    }
}
